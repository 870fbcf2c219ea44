//! webpush CLI - manage VAPID keys and send encrypted web push messages.
//!
//! This is the main binary entry point. See the `webpush` library for the
//! core functionality.

// Rust guideline compliant 2026-10

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use webpush::persistence::{self, KeyOrigin};
use webpush::{PushConfig, PushSender, Subscription, Urgency, VapidKeys};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
/// mimalloc provides better multi-threaded performance than the system allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser)]
#[command(name = "webpush")]
#[command(version)]
#[command(about = "Send end-to-end encrypted web push messages with VAPID")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the VAPID keypair
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
    /// Send a message to a subscription read from stdin
    Send {
        /// Message text (empty sends a payload-less push)
        #[arg(long, short, default_value = "Test")]
        message: String,
        /// Seconds the push service may hold the message
        #[arg(long, allow_negative_numbers = true)]
        ttl: Option<i64>,
        /// Delivery urgency: very-low, low, normal or high
        #[arg(long)]
        urgency: Option<Urgency>,
        /// Replace any pending message with the same topic
        #[arg(long)]
        topic: Option<String>,
        /// VAPID contact (e-mail or https URL)
        #[arg(long)]
        subscriber: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Generate a new keypair and write the PEM and JSON files
    Generate {
        /// PEM output path
        #[arg(long)]
        pem: Option<PathBuf>,
        /// JSON output path
        #[arg(long)]
        json: Option<PathBuf>,
        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },
    /// Print the public key (the browser's applicationServerKey)
    Show {
        /// Print the private key too, as web-push JSON
        #[arg(long)]
        private: bool,
    },
}

/// Key file locations from flags, falling back to the config.
fn key_paths(
    config: &PushConfig,
    pem: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<(PathBuf, PathBuf)> {
    let dir = PushConfig::config_dir()?;
    Ok((
        pem.unwrap_or_else(|| config.pem_path(&dir)),
        json.unwrap_or_else(|| config.json_path(&dir)),
    ))
}

fn generate_keys(
    config: &PushConfig,
    pem: Option<PathBuf>,
    json: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let (pem, json) = key_paths(config, pem, json)?;
    if !force {
        for path in [&pem, &json] {
            if path.exists() {
                anyhow::bail!(
                    "{} already exists; pass --force to replace it (existing subscriptions will stop working)",
                    path.display()
                );
            }
        }
    }

    let keys = VapidKeys::generate().context("Failed to generate VAPID keys")?;
    persistence::save_keys_pem(&pem, &keys)?;
    persistence::save_keys_json(&json, &keys)?;

    println!("Wrote {}", pem.display());
    println!("Wrote {}", json.display());
    println!("Public key: {}", keys.public_key_base64url());
    Ok(())
}

fn show_keys(config: &PushConfig, private: bool) -> Result<()> {
    let (pem, json) = key_paths(config, None, None)?;
    let keys = match persistence::load_keys_json(&json)? {
        Some(keys) => keys,
        None => persistence::load_keys_pem(&pem)?
            .context("No VAPID keys found; run `webpush keys generate` first")?,
    };

    if private {
        println!("{}", keys.to_json()?);
    } else {
        println!("{}", keys.public_key_base64url());
    }
    Ok(())
}

/// Read subscription JSON until it parses, bare or wrapped in
/// `{"subscription": ...}`.
fn read_subscription(reader: impl BufRead) -> Result<Subscription> {
    let mut raw = String::new();
    let mut last_err = None;

    for line in reader.lines() {
        let line = line.context("Failed to read subscription")?;
        raw.push_str(&line);
        raw.push('\n');

        let attempt = raw.trim();
        if attempt.is_empty() {
            continue;
        }
        match Subscription::from_json(attempt) {
            Ok(subscription) => return Ok(subscription),
            Err(e) => last_err = Some(e),
        }
    }

    match last_err {
        Some(e) => Err(e).context(
            "Could not parse a subscription (expecting a PushSubscription or {\"subscription\": {...}})",
        ),
        None => anyhow::bail!("No subscription given on stdin"),
    }
}

async fn send(config: PushConfig, message: String, overrides: SendOverrides) -> Result<()> {
    let (pem, json) = key_paths(&config, None, None)?;
    let (keys, origin) = persistence::load_or_generate(&pem, &json)?;
    if origin == KeyOrigin::Generated {
        eprintln!("Generated new VAPID keys. Public key: {}", keys.public_key_base64url());
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter subscription:");
    }
    let subscription = read_subscription(stdin.lock())?;
    log::info!("Sending to {:?}", subscription);

    let mut options = config.delivery_options();
    if let Some(ttl) = overrides.ttl {
        options.ttl = ttl;
    }
    if let Some(urgency) = overrides.urgency {
        options.urgency = Some(urgency);
    }
    if let Some(topic) = overrides.topic {
        options.topic = Some(topic);
    }
    if let Some(subscriber) = overrides.subscriber {
        options.subscriber = subscriber;
    }
    let timeout = overrides
        .timeout
        .map_or_else(|| config.timeout(), Duration::from_secs);

    let sender = PushSender::with_reqwest(keys)?.with_timeout(timeout);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let delivery = sender
        .send(message.as_bytes(), &subscription, &options, &cancel)
        .await
        .context("Push failed")?;

    println!("Response: {} ({})", delivery.response.status, delivery.outcome);
    let body = delivery.response.body_text();
    if !body.trim().is_empty() {
        println!("{}", body.trim());
    }

    if !delivery.outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// CLI flags that take precedence over the config file.
struct SendOverrides {
    ttl: Option<i64>,
    urgency: Option<Urgency>,
    topic: Option<String>,
    subscriber: Option<String>,
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let config = PushConfig::load()?;

    match cli.command {
        Commands::Keys { action } => match action {
            KeysAction::Generate { pem, json, force } => generate_keys(&config, pem, json, force)?,
            KeysAction::Show { private } => show_keys(&config, private)?,
        },
        Commands::Send {
            message,
            ttl,
            urgency,
            topic,
            subscriber,
            timeout,
        } => {
            let overrides = SendOverrides {
                ttl,
                urgency,
                topic,
                subscriber,
                timeout,
            };
            send(config, message, overrides).await?;
        }
    }

    Ok(())
}
