use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
    },
};
use slotkeeper_core::model::Booking;

use crate::app::{App, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let desk_name = app
        .selected_desk
        .as_ref()
        .map_or("no desk selected", |desk| desk.name.as_str());
    let header = Paragraph::new(format!("slotkeeper – {desk_name}"))
        .block(Block::default().borders(Borders::ALL).title("Slotkeeper"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::DeskSelect => draw_desk_select(frame, app, *content_area),
        Screen::Buckets => draw_buckets(frame, app, *content_area),
        Screen::BookForm => draw_book_form(frame, app, *content_area),
        Screen::Lookup | Screen::Amend => draw_lookup(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::DeskSelect => "↑/↓ move · Enter select desk · q/Ctrl-C quit",
        Screen::Buckets => {
            "↑/↓ move · Enter/b book · Tab or / look up · r refresh · Esc back · q quit"
        }
        Screen::BookForm => "Type to edit · ↑/↓/Tab switch field · Enter book · Esc back",
        Screen::Lookup => "Enter look up · Ctrl-D cancel booking · Ctrl-E amend · Esc back",
        Screen::Amend => "Type field=value · Enter apply · Esc back",
    };

    let (status_text, status_style) = if let Some(msg) = &app.error_message {
        (format!("{msg} · {nav_hint}"), Style::default().fg(Color::Red))
    } else if let Some(msg) = &app.info_message {
        (format!("{msg} · {nav_hint}"), Style::default().fg(Color::Green))
    } else {
        (nav_hint.to_owned(), Style::default())
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_desk_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .desks
        .iter()
        .enumerate()
        .map(|(idx, desk)| {
            let prefix = if idx == app.desk_list_index {
                "> "
            } else {
                "  "
            };
            ListItem::new(format!("{prefix}{}", desk.name))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select desk (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.desks.is_empty() {
        state.select(Some(app.desk_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_buckets(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = app.buckets.iter().map(|(bucket, occupancy)| {
        let details = bucket
            .attributes
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");

        let style = if occupancy.is_full() {
            Style::default().fg(Color::Red)
        } else if occupancy.available() <= 1 {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(bucket.key.to_string()),
            Cell::from(format!("{}/{}", occupancy.booked, occupancy.capacity)),
            Cell::from(occupancy.available().to_string()),
            Cell::from(details),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Min(24),
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Bucket", "Booked", "Free", "Details"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Buckets (↑/↓, Enter to book)"),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .column_spacing(1);

    let mut state = TableState::default();
    if !app.buckets.is_empty() {
        state.select(Some(app.bucket_list_index));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_book_form(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let bucket = app
        .form_bucket
        .as_ref()
        .map_or_else(|| "<bucket>".to_owned(), ToString::to_string);

    let items = app
        .form
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let prefix = if idx == app.form_index { "> " } else { "  " };
            ListItem::new(format!(
                "{prefix}{} ({}): {}",
                field.spec.name(),
                field.spec.kind(),
                field.input
            ))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Book {bucket} (Enter to submit)")),
        )
        .highlight_style(Style::default().fg(Color::Yellow));

    let mut state = ListState::default();
    if !app.form.is_empty() {
        state.select(Some(app.form_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_lookup(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(0),    // booking
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [input_area, booking_area] = chunks else {
        return;
    };

    let input = if app.screen == Screen::Amend {
        Paragraph::new(app.amend_input.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Amend (field=value, Enter)"),
        )
    } else {
        Paragraph::new(app.lookup_input.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Look up by {} or booking id (Enter)", app.lookup_label())),
        )
    };
    frame.render_widget(input.wrap(Wrap { trim: true }), *input_area);

    let Some(booking) = &app.found else {
        let paragraph = Paragraph::new("No booking loaded.")
            .block(Block::default().borders(Borders::ALL).title("Booking"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, *booking_area);
        return;
    };

    let table = Table::new(
        booking_rows(booking),
        [Constraint::Length(18), Constraint::Min(20)],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Booking {}", booking.id)),
    )
    .column_spacing(1);

    frame.render_widget(table, *booking_area);
}

fn booking_rows(booking: &Booking) -> Vec<Row<'static>> {
    let booked_at = booking
        .booked_at
        .with_timezone(&Local)
        .format("%d.%m.%Y %H:%M")
        .to_string();

    let mut rows = vec![
        Row::new(vec![Cell::from("id"), Cell::from(booking.id.to_string())]),
        Row::new(vec![Cell::from("bucket"), Cell::from(booking.bucket.to_string())]),
        Row::new(vec![Cell::from("position"), Cell::from(booking.position.to_string())]),
        Row::new(vec![Cell::from("booked at"), Cell::from(booked_at)]),
    ];
    rows.extend(booking.record.iter().map(|(name, value)| {
        Row::new(vec![Cell::from(name.to_owned()), Cell::from(value.to_string())])
            .style(Style::default().fg(Color::Cyan))
    }));
    rows
}
