//! `Taskboard`: terminal project board with optimistic sync.
//!
//! Launches the TUI against an in-memory remote seeded from a JSON file or a
//! demo board. Configuration via CLI flags, environment variables, or config
//! file (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Demo board
//! cargo run --bin taskboard
//!
//! # Seeded board with a slow remote
//! cargo run --bin taskboard -- --seed board.json --latency-ms 1500 --user-id alice
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::app::{App, StatusLine};
use taskboard::config::{BoardConfig, CliArgs};
use taskboard::coordinator::Coordinator;
use taskboard::remote::memory::InMemoryRemote;
use taskboard::remote::seed::Seed;
use taskboard::store::SharedStore;
use taskboard::ui;
use taskboard::worker::{self, BoardCommand, BoardEvent};

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match BoardConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            BoardConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(user = %config.user_id, "taskboard starting");

    let today = chrono::Local::now().date_naive();
    let seed = match &config.seed_file {
        Some(path) => Seed::from_file(path).map_err(io::Error::other)?,
        None => Seed::demo(today),
    };

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, seed, &config, today).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("taskboard exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    seed: Seed,
    config: &BoardConfig,
    today: chrono::NaiveDate,
) -> io::Result<()> {
    let remote = Arc::new(InMemoryRemote::from_seed(seed).with_latency(config.remote_latency));
    let store = SharedStore::default();
    let (coordinator, notices) =
        Coordinator::new(store.clone(), remote, config.coordinator_config());
    let coordinator = Arc::new(coordinator);

    let mut app = App::new(config.user_id.clone(), today)
        .with_formats(&config.date_format, &config.time_format);

    // Initial load happens before the first frame so the board is never
    // drawn half-populated.
    match coordinator.reload().await {
        Ok(tasks) => app.apply_event(BoardEvent::Reloaded { tasks }),
        Err(e) => app.apply_event(BoardEvent::Error(format!("Initial load failed: {e}"))),
    }

    let (cmd_tx, mut evt_rx) =
        worker::spawn_worker(Arc::clone(&coordinator), notices, &config.worker_config());

    loop {
        // Step 1: Pick up optimistic changes and outcomes.
        app.sync(&store);
        drain_board_events(&mut app, &mut evt_rx);
        app.pending = coordinator.pending();

        // Step 2: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if let Some(cmd) = app.handle_key_event(key) {
                match cmd_tx.try_send(cmd) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        app.status = Some(StatusLine {
                            text: "Busy, change not sent".to_string(),
                            is_error: true,
                        });
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        app.status = Some(StatusLine {
                            text: "Worker stopped".to_string(),
                            is_error: true,
                        });
                    }
                }
            }
        }

        if app.should_quit {
            let _ = cmd_tx.try_send(BoardCommand::Shutdown);
            return Ok(());
        }
    }
}

/// Drain all pending `BoardEvent`s from the receiver and apply them to the app.
fn drain_board_events(app: &mut App, rx: &mut mpsc::Receiver<BoardEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let BoardEvent::RolledBack(notice) = &event {
            tracing::debug!(seq = notice.seq, task_id = %notice.task_id, "rollback shown");
        }
        app.apply_event(event);
    }
}
