pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod models;
pub mod render;
pub mod server;
pub mod widget;

use cli::{ Args, ChatArgs, Command, InterruptRouter, ServeArgs };
use history::create_snapshot_storage;
use log::{ info, warn };
use server::Server;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };
use widget::{ PresetAnswer, TerminalView, WidgetController };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.command {
        Command::Serve(serve) => run_relay(serve).await,
        Command::Chat(chat) => run_chat(chat).await,
    }
}

async fn run_relay(args: ServeArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Relay Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Upstream URL: {}", args.upstream_url);
    info!("Upstream API Key: {}", if args.upstream_api_key.is_some() { "configured" } else { "missing" });
    info!("Upstream Timeout: {}s", args.upstream_timeout_secs);
    info!("Rate Limit: {}/s", args.rate_limit_per_second);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("---------------------------");

    let server = Server::new(args)?;
    server.run().await
}

async fn run_chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = args.widget_config()?;
    let client = llm::chat::new_client(&config)?;

    info!("--- Widget Configuration ---");
    info!("API URL: {}", client.get_base_url());
    info!("Model: {}", client.get_model());
    info!("Max Messages: {}", config.max_messages);
    info!("Cache Expiry: {}ms", config.cache_expiry);
    info!("Request Timeout: {}s", config.request_timeout_secs);
    info!("Storage Type: {}", args.storage_type);
    info!("----------------------------");
    if config.api_key.is_some() {
        warn!("A client-side API key is configured; requests bypass the relay's credential handling.");
    }

    let storage = create_snapshot_storage(&args)?;
    let controller = WidgetController::new(config, client, storage, Arc::new(TerminalView));
    controller.init().await;
    controller.open().await;

    let interrupts = Arc::new(InterruptRouter::new());
    let watcher = {
        let interrupts = interrupts.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                interrupts.interrupt().await;
            }
        })
    };
    let shutdown = interrupts.shutdown().clone();

    println!("Type a message and press Enter. Commands: /clear, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                println!("Clear the conversation history? [y/N]");
                let answer = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    answer = lines.next_line() => answer?.unwrap_or_default(),
                };
                let confirmed = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");
                controller.clear(&PresetAnswer(confirmed)).await;
            }
            _ => {
                let cancel = interrupts.begin_request().await;
                controller.send_with_cancel(&line, &cancel).await;
                interrupts.end_request().await;
            }
        }
    }
    watcher.abort();

    Ok(())
}
