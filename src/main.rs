//! dynform - fill in any form schema from the terminal
//!
//! Usage: `dynform [SCHEMA]`. Without an argument the schema comes from
//! `DYNFORM_SCHEMA` or the config file.

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dynform::app::App;
use dynform::config::FormConfig;
use dynform::schema::FormSchema;
use dynform::ui;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, File};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "dynform.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config = FormConfig::load()?
        .with_env()
        .with_schema_arg(std::env::args().nth(1));

    init_logging(&config);

    let schema_path = config.schema_path()?;
    let schema = FormSchema::load(schema_path)
        .map_err(|e| anyhow!("Failed to load {}: {}", schema_path.display(), e))?;
    let initial = config.load_initial_values()?;
    let submitter = config.submitter();
    tracing::info!(
        "Opened form '{}' from {}",
        schema.display_title(),
        schema_path.display()
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(schema, initial, submitter);
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

/// Log to a file in the data dir so the alternate screen stays clean
fn init_logging(config: &FormConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    let log_file = FormConfig::data_dir().and_then(|dir| {
        fs::create_dir_all(&dir).ok()?;
        File::create(dir.join(LOG_FILE)).ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll faster while a submission is running so its result shows promptly
        let poll_duration = if app.form.is_submitting() {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(100)
        };

        if event::poll(poll_duration)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key)?;
                }
                Event::Resize(_width, _height) => {
                    // Layout is recalculated on next draw
                }
                _ => {}
            }
        }

        // Let the submit task run between polls
        tokio::task::yield_now().await;
        app.poll_submissions();

        if app.should_quit() {
            return Ok(());
        }
    }
}
