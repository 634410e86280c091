//! cvwiz - Résumé Intake Wizard
//!
//! A terminal form that walks through personal data, professional
//! experience and education. Progress is saved between sessions and the
//! collected data is handed to a configurable destination on save.

use std::io;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use cvwiz::application::{App, AppMode};
use cvwiz::infrastructure::{Cli, init_logging};
use cvwiz::presentation::{render_ui, InputHandler};

/// How long the event loop waits for input when no validation is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Entry point for the cvwiz terminal wizard.
///
/// Parses the command line, sets up logging and the terminal, restores the
/// saved session and runs the main event loop until the user quits.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened, if terminal setup
/// fails or if there are issues with the terminal interface during runtime.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config();
    init_logging(config.log_file.as_deref())?;
    info!("starting with submissions going to {}", config.submit_to);

    let mut app = App::from_config(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("terminal error: {err}");
        println!("{err:?}");
    }
    if let Some(receipt) = &app.last_receipt {
        println!("Data saved: {receipt}");
    }

    Ok(())
}

/// Main application event loop.
///
/// Waits for keyboard input, waking up early when a debounced validation
/// is due. Continues running until the user presses 'q' in normal mode.
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        let timeout = app.next_deadline(Instant::now()).unwrap_or(IDLE_POLL);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.mode == AppMode::Normal => return Ok(()),
                        _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                    }
                }
            }
        }
        app.tick(Instant::now());
    }
}
