mod chatlog;
mod commands;
mod gateway;
mod http;

use clap::{Parser, Subcommand};
use lapak_channels::whatsapp::WhatsAppChannel;
use lapak_core::{config, traits::Channel};
use lapak_store::{FileBackend, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "lapak",
    version,
    about = "Lapak — WhatsApp customer-service counter bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Show configuration and live session state.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Start => {
            let cfg = config::load(&cli.config)?;

            // Build channels.
            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
            if let Some(ref wa) = cfg.channel.whatsapp {
                if wa.enabled {
                    let channel = WhatsAppChannel::new(wa.clone(), &cfg.bot.data_dir);
                    channels.insert("whatsapp".to_string(), Arc::new(channel));
                }
            }
            if channels.is_empty() {
                anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
            }

            if cfg.admin.numbers.is_empty() {
                tracing::warn!("no admin numbers configured; `close` commands are unreachable");
            }

            // Build the session store.
            let store_path = config::shellexpand(&cfg.session.store_path);
            let backend = Arc::new(FileBackend::new(store_path));
            let store = SessionStore::open(backend).await?;

            println!("{} — starting bot...", cfg.bot.name);
            let mut gw = gateway::Gateway::new(channels, store, cfg);
            gw.run().await?;
        }
        Commands::Status => {
            let cfg = config::load(&cli.config)?;
            println!("Lapak — Status\n");
            println!("Config: {}", cli.config);
            println!("Admins: {}", cfg.admin.numbers.len());
            println!("Whitelist: {}", cfg.admin.whitelist.len());
            println!(
                "Timeouts: call {}s, order {}s, sweep every {}s",
                cfg.session.call_timeout_secs,
                cfg.session.order_timeout_secs,
                cfg.session.sweep_interval_secs
            );
            println!("HTTP port: {}", cfg.http.port);
            println!(
                "WhatsApp: {}",
                match cfg.channel.whatsapp {
                    Some(ref wa) if wa.enabled => "enabled",
                    Some(_) => "disabled",
                    None => "not configured",
                }
            );

            let store_path = config::shellexpand(&cfg.session.store_path);
            let backend = Arc::new(FileBackend::new(store_path));
            let store = SessionStore::open(backend).await?;
            let mut sessions = store.all().await;
            sessions.sort_by(|a, b| a.0.cmp(&b.0));
            println!("\nSessions: {}", sessions.len());
            for (id, session) in sessions {
                println!("  {id}: {:?} (last activity {})", session.state, session.last_activity);
            }
        }
    }

    Ok(())
}
