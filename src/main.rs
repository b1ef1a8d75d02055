mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{dispatch, Cli};
use studybuddy_client::shell::plain_text;
use studybuddy_client::{App, AppState, FileTokenStore, Settings};

async fn print_page(app: &App) {
    println!("== {} ==", app.current_page());
    for (id, html) in app.page_view().await {
        let text = plain_text(&html);
        if !text.is_empty() {
            println!("[{}]\n{}", id, text);
        }
    }
    if let Some(toast) = app.toasts.last().await {
        println!("({:?}) {}", toast.kind, toast.message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = Settings::new().context("failed to load configuration")?;
    info!("Configuration loaded successfully");
    info!("Using API at {}", config.api.base_url);

    let store = FileTokenStore::open(&config.api.storage_path)
        .with_context(|| format!("failed to open storage at {}", config.api.storage_path.display()))?;
    let state = AppState::new(config, Arc::new(store))?;

    let (mut app, mut commands) = App::new(state);
    app.start().await;
    print_page(&app).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(args) = shlex::split(&line) else {
                    warn!("Unbalanced quotes in: {}", line);
                    continue;
                };
                match Cli::try_parse_from(args) {
                    Ok(cli) => {
                        if !dispatch(&mut app, cli.command).await {
                            break;
                        }
                        print_page(&app).await;
                    }
                    Err(e) => println!("{}", e.render()),
                }
            }
            Some(command) = commands.recv() => {
                app.handle_command(command).await;
                print_page(&app).await;
            }
        }
    }

    app.chat.close().await;
    info!("Goodbye");
    Ok(())
}
