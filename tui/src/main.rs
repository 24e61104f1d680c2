//! Cortex TUI Entry Point
//!
//! Launches the terminal UI for Cortex, the AI career assistant.
//!
//! Configuration comes from `~/.config/cortex/cortex.toml` plus the
//! `CORTEX_BASE_URL`, `CORTEX_TTS_VOICE` and `CORTEX_TTS_LANG` environment
//! variables. Credentials persist in `~/.config/cortex/auth.json`; when no
//! token is stored a login prompt runs before the TUI starts.

use std::io;
use std::panic;
use std::sync::Arc;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cortex_core::{
    AudioOutput, AuthContext, ConversationSession, CortexConfig, FileTokenStore, HttpAgentClient,
    NullAudioOutput,
};
use cortex_tui::audio::RodioOutput;
use cortex_tui::login::run_login_prompt;
use cortex_tui::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: cortex-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        std::process::exit(1);
    }

    let config = CortexConfig::load();

    let store = match FileTokenStore::default_path() {
        Some(path) => FileTokenStore::new(path),
        None => {
            eprintln!("Error: no config directory available for credential storage");
            std::process::exit(1);
        }
    };
    let auth = AuthContext::new(Arc::new(store));

    // Log in before entering the alternate screen
    if !auth.is_authenticated() && !run_login_prompt(&config.base_url, &auth).await? {
        return Ok(());
    }

    let agent = Arc::new(HttpAgentClient::new(config.base_url.as_str()));
    let audio: Arc<dyn AudioOutput> = match RodioOutput::new() {
        Ok(output) => Arc::new(output),
        Err(error) => {
            tracing::warn!(%error, "No audio device; speech requests will be ignored");
            Arc::new(NullAudioOutput)
        }
    };
    let session = ConversationSession::new(agent, audio, auth, config.voice_settings());

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = run_app(&mut terminal, session).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Propagate any errors
    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: ConversationSession,
) -> anyhow::Result<()> {
    let mut app = App::new(session)?;
    app.run(terminal).await?;

    if app.logged_out() {
        println!("Logged out. See you next time!");
    }

    Ok(())
}
