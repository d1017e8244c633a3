//! Folio — a Telegram bot that merges a user's photo uploads into one PDF.

use clap::Parser;
use folio_registry::SqliteUserRegistry;
use folio_session::{SessionHandler, SessionRouter};
use folio_staging::{ImagePdfAssembler, StagingStore};
use folio_telegram::{InboundAction, MessageCatalog, TelegramChannel};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio", about = "Folio — photos to PDF over Telegram")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "folio.toml")]
    config: PathBuf,
}

#[derive(Deserialize)]
struct FolioConfig {
    /// Bot token obtained from @BotFather.
    bot_token: String,
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default = "default_messages")]
    messages: PathBuf,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_poll_timeout")]
    poll_timeout_secs: u64,
    #[serde(default = "default_event_buffer")]
    event_buffer: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_messages() -> PathBuf {
    PathBuf::from("./messages.yaml")
}
fn default_language() -> String {
    "en".to_string()
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_event_buffer() -> usize {
    64
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = tokio::fs::read_to_string(&cli.config).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            cli.config.display(),
            e
        )
    })?;
    let config: FolioConfig = toml::from_str(&config_str)?;

    // Startup is strictly ordered: sessions are not persisted across
    // restarts, so the staging root must be reset — and finish resetting —
    // before the first event can arrive.
    let registry = Arc::new(SqliteUserRegistry::open(config.data_dir.join("users.db")).await?);
    let store = Arc::new(
        StagingStore::open(
            config.data_dir.join("staging"),
            Arc::new(ImagePdfAssembler::new()),
        )
        .await?,
    );
    store.reset_all().await?;

    let catalog = MessageCatalog::load(&config.messages, &config.language).await?;
    let mut channel = TelegramChannel::new(
        config.bot_token,
        catalog,
        config.event_buffer,
        config.poll_timeout_secs,
    );
    let mut events = channel
        .take_event_receiver()
        .ok_or_else(|| anyhow::anyhow!("event receiver already taken"))?;
    let channel = Arc::new(channel);

    let handler = Arc::new(SessionHandler::new(store, registry));
    let router = Arc::new(SessionRouter::new(handler));

    let poller = Arc::clone(&channel);
    tokio::spawn(async move {
        if let Err(e) = poller.poll_updates().await {
            error!(error = %e, "update polling stopped");
        }
    });

    info!("folio bot started");

    // Events are enqueued on the per-user session workers from this single
    // loop, which preserves per-user arrival order; only the replies are
    // awaited concurrently.
    while let Some(inbound) = events.recv().await {
        let user = inbound.user;

        if inbound.action == InboundAction::Info {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move {
                if let Err(e) = channel.send_info(user).await {
                    error!(%user, error = %e, "info send failed");
                }
            });
            continue;
        }

        let Some(event) = channel.to_session_event(inbound.action) else {
            continue;
        };
        let reply_rx = match router.submit(user, event).await {
            Ok(rx) => rx,
            Err(e) => {
                error!(%user, error = %e, "event submission failed");
                continue;
            }
        };

        let channel = Arc::clone(&channel);
        let trigger_id = inbound.message_id;
        tokio::spawn(async move {
            let reply = match reply_rx.await {
                Ok(Ok(reply)) => reply,
                Ok(Err(e)) => {
                    error!(%user, error = %e, "session event failed");
                    if let Err(e) = channel.send_text(user, "error", None).await {
                        error!(%user, error = %e, "error notice send failed");
                    }
                    return;
                }
                Err(_) => return,
            };
            if let Err(e) = channel.deliver(user, trigger_id, reply).await {
                error!(%user, error = %e, "reply delivery failed");
            }
        });
    }

    Ok(())
}
