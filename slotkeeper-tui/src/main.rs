//! Terminal UI for slotkeeper that lets staff book, look up, amend, and cancel reservations at
//! the clinic, school, and bus desks.

mod app;
mod config;
mod input;
mod ui;

use std::{
    fs::OpenOptions,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use slotkeeper_core::{plugin::DeskRegistry, service::ReservationService};
use slotkeeper_desk_bus as bus;
use slotkeeper_desk_clinic as clinic;
use slotkeeper_desk_school as school;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{AppConfig, LoggingConfig};
use crate::input::Action;

fn main() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_logging(&config.logging)?;

    // Desk + service setup
    let desks = vec![
        clinic::desk(&config.clinic).context("building clinic desk")?,
        school::desk(&config.school).context("building school desk")?,
        bus::desk(&config.bus).context("building bus desk")?,
    ];
    let registry = DeskRegistry::new(desks)?;
    let service = Arc::new(ReservationService::new(registry));
    info!(desks = service.desks().len(), "slotkeeper started");

    // App state
    let app = App::new(service);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("slotkeeper stopped");
    res
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
        .with_context(|| format!("opening log file {}", logging.file.display()))?;

    // RUST_LOG wins over the configured directive
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_err) => EnvFilter::try_new(&logging.filter)
            .with_context(|| format!("parsing log filter {:?}", logging.filter))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (small timeout to keep CPU low)
        if event::poll(Duration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::SubmitBooking => app.submit_booking(),
                Action::Lookup => app.lookup(),
                Action::CancelBooking => app.cancel_found(),
                Action::AmendBooking => app.submit_amend(),
            }
        }
    }

    Ok(())
}
