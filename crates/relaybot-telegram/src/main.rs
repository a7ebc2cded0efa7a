//! Relaybot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_TOKEN=xxx HF_TOKEN=yyy cargo run -p relaybot-telegram
//! ```

use clap::Parser;
use relaybot_core::RelayConfig;
use relaybot_telegram::{DeliveryMode, RelayBot};
use tracing_subscriber::EnvFilter;

/// Relaybot - relay Telegram messages to a hosted language model
#[derive(Parser, Debug)]
#[command(name = "relaybot")]
#[command(about = "Telegram bot that answers messages with a hosted language model")]
struct Args {
    /// How updates are delivered
    #[arg(short, long, value_enum, default_value_t = DeliveryMode::Polling, env = "DELIVERY_MODE")]
    mode: DeliveryMode,

    /// Webhook port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Local overrides first, then .env
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "relaybot=info,relaybot_telegram=info,relaybot_core=info,teloxide=warn",
        1 => "relaybot=debug,relaybot_telegram=debug,relaybot_core=debug,teloxide=info",
        2 => "relaybot=trace,relaybot_telegram=trace,relaybot_core=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = RelayConfig::from_env()?;
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    let bot = RelayBot::new(config)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Relaybot");
            println!("   Bot: @{}", username);
            println!("   Mode: {}", args.mode);
            println!("   Endpoints: {}", bot.relay().client().endpoints().len());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n   Press Ctrl+C to stop\n");

    bot.start(args.mode).await?;

    Ok(())
}
