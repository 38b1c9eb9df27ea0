use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `service.book`(...) with the filled form
    SubmitBooking,
    /// Run `service.view`(...) for the typed key
    Lookup,
    /// Run `service.cancel`(...) for the booking on screen
    CancelBooking,
    /// Run `service.amend`(...) with the typed `field=value`
    AmendBooking,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{BackTab, Backspace, Char, Down, Enter, Esc, Tab, Up};

    let control = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global quit shortcut; plain `q` only quits on screens without text input
    if control && key.code == Char('c') {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::DeskSelect => match key.code {
            Char('q') => action = Action::Quit,
            Up | Char('k') => {
                app.desk_list_index = app.desk_list_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.desk_list_index + 1 < app.desks.len() {
                    app.desk_list_index += 1;
                }
            }
            Enter | Char(' ') => app.select_current_desk(),
            _ => {}
        },

        Screen::Buckets => match key.code {
            Char('q') => action = Action::Quit,
            Up | Char('k') => {
                app.bucket_list_index = app.bucket_list_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.bucket_list_index + 1 < app.buckets.len() {
                    app.bucket_list_index += 1;
                }
            }
            Enter | Char('b') => app.open_form_for_current_bucket(),
            Char('/') | Tab => {
                app.clear_messages();
                app.screen = Screen::Lookup;
            }
            Char('r') => app.refresh_buckets(),
            Esc => {
                app.clear_messages();
                app.screen = Screen::DeskSelect;
            }
            _ => {}
        },

        Screen::BookForm => match key.code {
            Up | BackTab => {
                app.form_index = app.form_index.saturating_sub(1);
            }
            Down | Tab => {
                if app.form_index + 1 < app.form.len() {
                    app.form_index += 1;
                }
            }
            Char(character) if !control => {
                if let Some(input) = app.current_form_input() {
                    input.push(character);
                }
            }
            Backspace => {
                if let Some(input) = app.current_form_input() {
                    input.pop();
                }
            }
            Enter => action = Action::SubmitBooking,
            Esc => {
                app.form.clear();
                app.form_bucket = None;
                app.screen = Screen::Buckets;
            }
            _ => {}
        },

        Screen::Lookup => match key.code {
            Char('d') if control => action = Action::CancelBooking,
            Char('e') if control => app.start_amend(),
            Char(character) if !control => app.lookup_input.push(character),
            Backspace => {
                app.lookup_input.pop();
            }
            Enter => action = Action::Lookup,
            Esc => {
                app.found = None;
                app.clear_messages();
                app.screen = Screen::Buckets;
            }
            _ => {}
        },

        Screen::Amend => match key.code {
            Char(character) if !control => app.amend_input.push(character),
            Backspace => {
                app.amend_input.pop();
            }
            Enter => action = Action::AmendBooking,
            Esc => app.screen = Screen::Lookup,
            _ => {}
        },
    }
    action
}
