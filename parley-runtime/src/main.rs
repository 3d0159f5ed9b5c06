use std::error::Error;

use parley_core::{EnvCredentials, Session, SessionConfig};
use parley_runtime::command::HELP;
use parley_runtime::{ChatView, Command};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// A simple interactive chat on stdin/stdout.
///
/// Input is read on the main task while replies are printed by a second task as session
/// events arrive, so the prompt never blocks on a provider.
async fn run_chat() -> Result<(), Box<dyn Error>> {
    let config = SessionConfig::from_env()?;
    let credentials = EnvCredentials::new();
    let (session, mut events) = Session::with_credentials(config, &credentials);

    println!("=== Parley Chat ({}) ===", session.provider());
    println!("Type your messages and press enter to send.");
    println!("{HELP}");
    println!();

    let printer = tokio::spawn(async move {
        let mut view = ChatView::new();
        while let Some(event) = events.recv().await {
            if let Some(line) = view.apply(event) {
                println!("{line}");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.parse::<Command>() {
            Ok(command) => {
                if !command.apply(&session) {
                    break;
                }
            }
            Err(e) => {
                warn!("Rejected input: {}", e);
                println!("{e}");
            }
        }
    }

    println!("Goodbye!");
    drop(session);
    printer.abort();
    Ok(())
}

#[tokio::main]
pub async fn main() {
    let _ = dotenvy::dotenv();

    // Set up tracing
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
        .add_directive("reqwest=info".parse().expect("static directive"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting Parley Chat");

    if let Err(e) = run_chat().await {
        eprintln!("Error: {}", e);
    }
}
