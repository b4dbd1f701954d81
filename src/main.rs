use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use sdk_console::app::{App, AppEvent};
use sdk_console::config::ConsoleConfig;
use sdk_console::global_prefs::{console_prefs, init_console_prefs};
use sdk_console::sdk::{LoopbackClient, SdkHandle};
use sdk_console::state::{ConsoleLog, ConsoleResult};
use sdk_console::{handlers, logging, pages, ui};
use std::{io, time::Duration};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

type ConsoleTerminal = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> ConsoleResult<()> {
    let config = ConsoleConfig::parse();

    init_console_prefs(config.prefs_path());
    let console = ConsoleLog::new(console_prefs().console_capacity);
    logging::init_logging(&config.log_level, config.log_file.as_deref(), console.clone())?;
    logging::install_panic_hook();

    let store = config.param_store();
    let sdk = SdkHandle::global().clone();
    let loopback = config.loopback_options();
    if !config.no_auto_create {
        let options = loopback.clone();
        sdk.create_with(|events| LoopbackClient::new(options, events));
    }
    let params = if config.in_memory {
        "memory".to_string()
    } else {
        config.params_path().display().to_string()
    };
    info!(params = %params, auto_create = !config.no_auto_create, "console starting");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut app = App::new(sdk.clone(), store, pages::catalog(&loopback), console, event_tx.clone());

    // Enable terminal raw mode
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Spawn terminal event handler
    let tick_ms = app.config.tick_ms;
    let event_tx_clone = event_tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        loop {
            interval.tick().await;

            // Check for terminal events (non-blocking)
            while event::poll(Duration::from_millis(0)).unwrap_or(false) {
                match event::read() {
                    Ok(event) => {
                        if event_tx_clone.send(AppEvent::Terminal(event)).is_err() {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }

            if event_tx_clone.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    // Forward SDK events; the bus outlives individual instances
    let mut sdk_events = sdk.subscribe();
    tokio::spawn(async move {
        loop {
            match sdk_events.recv().await {
                Ok(event) => {
                    if event_tx.send(AppEvent::Sdk(event)).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "console fell behind the SDK event stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let result = run_app(&mut terminal, &mut app, &mut event_rx).await;

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut ConsoleTerminal,
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> ConsoleResult<()> {
    while !app.ui.should_quit {
        terminal.draw(|f| ui::ui(f, app))?;

        let Some(event) = event_rx.recv().await else { break };
        match event {
            AppEvent::Terminal(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                handlers::handle_key_event(key, app);
            }
            AppEvent::Terminal(_) => {}
            AppEvent::Sdk(event) => app.handle_sdk_event(event),
            AppEvent::CallFinished(completion) => app.finish_call(completion),
            AppEvent::Tick => app.on_tick(),
        }
    }
    info!("console exiting");
    Ok(())
}
