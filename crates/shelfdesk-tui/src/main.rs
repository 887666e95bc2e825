//! shelfdesk - a terminal admin console for a product catalogue API.
//!
//! Without arguments this starts the interactive TUI. Two non-interactive
//! commands are available:
//!
//! - `shelfdesk --list [PAGE]` prints one page of products as JSON
//! - `shelfdesk --logout` signs out and removes the stored credential

mod app;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use shelfdesk_core::api::ApiClient;
use shelfdesk_core::config::ENV_PASSWORD;
use shelfdesk_core::{Config, Console, CredentialStore, LoginForm};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "shelfdesk.log";

const USAGE: &str = "\
Usage: shelfdesk [--list [PAGE] | --logout]

  (no arguments)   start the interactive console
  --list [PAGE]    print one page of products as JSON (default page 1)
  --logout         sign out and remove the stored credential";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr (CLI commands)
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Log to a daily rolling file; stderr would corrupt the alternate screen.
fn init_file_tracing() -> Result<WorkerGuard> {
    let dir = Config::cache_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(guard)
}

fn load_config() -> Config {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    config.apply_env_overrides();
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("--list") => {
            init_stderr_tracing();
            let page = match args.get(1) {
                Some(raw) => raw
                    .parse::<u32>()
                    .ok()
                    .filter(|p| *p > 0)
                    .with_context(|| format!("Invalid page number: {}", raw))?,
                None => 1,
            };
            return list_page(load_config(), page).await;
        }
        Some("--logout") => {
            init_stderr_tracing();
            return logout(load_config()).await;
        }
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some(other) => bail!("Unknown argument: {}\n\n{}", other, USAGE),
        None => {}
    }

    // Initialize logging; keep the guard alive so buffered lines are flushed
    let _guard = init_file_tracing()?;
    info!("shelfdesk starting");

    // Build the app before touching the terminal so config errors print normally
    let mut app = App::new(load_config())?;
    app.startup().await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("shelfdesk shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Apply finished page fetches
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// CLI commands
// ============================================================================

fn cli_console(config: &Config) -> Result<Console<ApiClient, Box<dyn CredentialStore>>> {
    let api = ApiClient::new(&config.api_base, config.api_path()?)?;
    Ok(Console::new(api, config.credential_store()?))
}

/// Prompt for credentials on the terminal.
fn prompt_login(config: &Config) -> Result<LoginForm> {
    let username = match config.last_username {
        Some(ref last) => {
            eprint!("Email [{}]: ", last);
            io::stderr().flush()?;
            let input = read_line()?;
            if input.is_empty() {
                last.clone()
            } else {
                input
            }
        }
        None => {
            eprint!("Email: ");
            io::stderr().flush()?;
            read_line()?
        }
    };

    let password = match std::env::var(ENV_PASSWORD) {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Password: ")?,
    };

    Ok(LoginForm::new(username, password))
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Print one page of products as JSON, signing in interactively if the
/// stored credential is missing or no longer accepted.
async fn list_page(config: Config, page: u32) -> Result<()> {
    let mut console = cli_console(&config)?;

    // Not signed in yet, so this only moves the cursor
    let _ = console.set_page(page);

    let request = match console.resume().await {
        Some(request) => request,
        None => {
            console.login = prompt_login(&config)?;
            let username = console.login.username.trim().to_string();
            let request = console
                .authenticate()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?
                .context("Signed in but no session is active")?;

            if let Err(e) = Config::remember_username(&Config::config_path()?, &username) {
                warn!(error = %e, "Failed to save config");
            }
            request
        }
    };

    let outcome = request.send(console.api()).await;
    let products = outcome
        .result
        .with_context(|| format!("Failed to fetch page {}", page))?;

    println!("{}", serde_json::to_string_pretty(&products)?);
    Ok(())
}

/// Sign out and remove the stored credential.
async fn logout(config: Config) -> Result<()> {
    let mut console = cli_console(&config)?;

    // Validates the stored token; an invalid one is removed here already
    if console.resume().await.is_none() {
        eprintln!("Not signed in.");
        return Ok(());
    }

    match console.sign_out().await {
        Ok(()) => eprintln!("Signed out."),
        Err(e) => eprintln!("{} (local credential removed)", e.user_message()),
    }
    Ok(())
}
