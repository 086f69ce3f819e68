use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use parley::client::{apply_command, run_client};
use parley::command::ClientCommand;
use parley::logging::targets;
use parley::settings::ClientSettings;
use parley::terminal::{TerminalControls, TerminalDisplay};
use parley::{ConnectionManager, TimerManager, WsTransport};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Chat with a conversational server over WebSocket", long_about = None)]
struct Cli {
    /// Conversation to join on start-up
    #[arg(long)]
    conversation: Option<String>,

    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server endpoint the conversation ID is appended to
    #[arg(short, long)]
    url: Option<String>,

    /// Automatic reconnection attempts before giving up
    #[arg(long)]
    max_reconnect_attempts: Option<u32>,
}

/// Log to stderr so diagnostics never mix with rendered lines.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .compact(),
        )
        .init();
}

fn load_settings(cli: &Cli) -> anyhow::Result<ClientSettings> {
    let mut settings = match &cli.config {
        Some(path) => ClientSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ClientSettings::default(),
    };

    settings.apply_env_overrides()?;

    if let Some(url) = &cli.url {
        settings.url = url.clone();
    }
    if let Some(attempts) = cli.max_reconnect_attempts {
        settings.max_reconnect_attempts = attempts;
    }

    settings.validate()?;
    Ok(settings)
}

/// Read stdin on its own thread; commands whose control is disabled are
/// refused before they reach the event loop.
fn spawn_input_reader<W>(
    controls: Arc<Mutex<TerminalControls<W>>>,
    commands: mpsc::UnboundedSender<ClientCommand>,
) where
    W: io::Write + Send + 'static,
{
    std::thread::spawn(move || {
        for line in io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(target: targets::CLIENT, error = %err, "failed to read input");
                    break;
                }
            };

            let command = ClientCommand::parse(&line);
            let quit = command == ClientCommand::Quit;
            if controls.lock().admit(&command) && commands.send(command).is_err() {
                break;
            }
            if quit {
                break;
            }
        }
        // Dropping the sender ends the event loop on EOF.
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    tracing::info!(target: targets::CLIENT, url = %settings.url, "starting");

    let (transport, mut events) = WsTransport::new(settings.transport_config());
    let mut manager =
        ConnectionManager::new(settings.session_config(), transport, TimerManager::new());

    let display = Arc::new(Mutex::new(TerminalDisplay::new(io::stdout())));
    let controls = Arc::new(Mutex::new(TerminalControls::new(io::stdout())));
    manager.bind_display(display);
    manager.bind_controls(controls.clone());

    println!("Commands: /connect <conversation-id>, /disconnect, /quit. Anything else is sent.");

    if let Some(conversation) = cli.conversation {
        apply_command(&mut manager, ClientCommand::Connect(conversation));
    }

    let (commands_tx, mut commands) = mpsc::unbounded_channel();
    spawn_input_reader(controls, commands_tx);

    run_client(&mut manager, &mut events, &mut commands).await;
    Ok(())
}
