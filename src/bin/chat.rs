//! # Persona Chat
//!
//! Terminal chat with literary personas.
//!
//! Usage: `cargo run --bin persona-chat`

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info};
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use persona_chat::core::Config;
use persona_chat::features::completion::{CompletionClient, OpenAiCompletionClient};
use persona_chat::features::personas::PersonaRegistry;
use persona_chat::tui::event::map_key_event;
use persona_chat::tui::{spawn_completion, App, Event, EventHandler, Focus};

/// TUI refresh rate
const TICK_RATE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    // Before logging, so RUST_LOG and PERSONA_CHAT_LOG can come from .env
    let dotenv_path = dotenvy::dotenv().ok();
    init_logging()?;
    if let Some(path) = dotenv_path {
        debug!("Loaded environment from {}", path.display());
    }

    // Configuration problems are fatal before the terminal is taken over
    let config = Config::from_env().context("persona chat cannot start")?;
    let registry = match &config.personas_file {
        Some(path) => PersonaRegistry::load_file(path).context("persona chat cannot start")?,
        None => PersonaRegistry::builtin(),
    };
    let registry = Arc::new(registry);
    let client: Arc<dyn CompletionClient> = Arc::new(OpenAiCompletionClient::new(&config));

    let mut app = App::new(registry.clone(), client.model())?;
    info!(
        "Starting session {} with {} persona(s), model {}",
        app.session.id(),
        registry.len(),
        config.model
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (mut events, event_tx) = EventHandler::new(TICK_RATE);

    // Main loop
    let result = run_app(&mut terminal, &mut app, &mut events, &event_tx, client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!("Application error: {}", e);
        return Err(e);
    }

    info!("Session {} ended", app.session.id());
    Ok(())
}

/// Log to stderr, or to the file named by PERSONA_CHAT_LOG so the TUI stays clean
fn init_logging() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    if let Ok(path) = std::env::var("PERSONA_CHAT_LOG") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("cannot open log file {path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    event_tx: &UnboundedSender<Event>,
    client: Arc<dyn CompletionClient>,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|frame| {
            persona_chat::tui::ui::render(frame, app);
        })?;
        app.session.mark_rendered();

        let Some(event) = events.next().await else {
            break;
        };

        match event {
            Event::Key(key) => {
                let action = map_key_event(key, app.focus == Focus::Input);
                if let Some(history) = app.handle_action(action) {
                    spawn_completion(client.clone(), history, event_tx.clone());
                }
            }
            Event::Stream(stream_event) => {
                app.handle_stream_event(stream_event);
            }
            Event::Tick | Event::Resize(_, _) => {
                // Terminal will redraw on the next iteration
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
