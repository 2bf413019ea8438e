//! lantern host binary.
//!
//! Boots the controller from configuration and feeds it worker lifecycle
//! events. Results are printed as JSON on stdout; logs go to stderr.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lantern_core::cache::key::compute_cache_key;
use lantern_core::{AppConfig, CacheStore};
use lantern_worker::fetch::{canonicalize, resolve};
use lantern_worker::{
    Controller, Destination, EventOutcome, FetchConfig, Method, ReqwestBackend, WorkerEvent, WorkerRequest,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lantern")]
#[command(about = "Offline cache controller")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pre-cache the manifest, then activate immediately.
    Install,
    /// Sweep superseded cache generations.
    Activate,
    /// Run one request through its retrieval policy.
    Fetch {
        /// URL, or absolute path resolved against the configured origin.
        target: String,

        /// Destination hint: document, style, script, image, font, other.
        #[arg(short, long, default_value = "other")]
        destination: Destination,

        /// Accept header to send.
        #[arg(long)]
        accept: Option<String>,

        /// HTTP method.
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Write the response body to stdout instead of the JSON summary.
        #[arg(long)]
        body: bool,
    },
    /// Deliver a message event (e.g. SKIP_WAITING).
    Message { payload: String },
    /// Inspect or maintain the cache store.
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Print the stored entry for a URL or absolute path.
    Get {
        target: String,

        #[arg(short, long, default_value = "GET")]
        method: String,
    },
    /// Per-generation entry counts.
    List,
    /// Delete every generation other than the current two.
    Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;

    tracing::info!(db_path = %config.db_path.display(), "opening cache store");
    let store = CacheStore::open(&config.db_path).await?;
    let backend = ReqwestBackend::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let controller = Controller::new(config.clone(), store.clone(), Arc::new(backend))?;

    match args.command {
        Command::Install => {
            // Install never waits: activation follows immediately.
            let install = controller.install().await;
            let activate = controller.activate().await?;
            print_json(&serde_json::json!({ "install": install, "activate": activate }))?;
        }
        Command::Activate => {
            let report = controller.activate().await?;
            print_json(&report)?;
        }
        Command::Fetch { target, destination, accept, method, body } => {
            let url = resolve_target(&config, &target)?;
            let method: Method = method.to_uppercase().parse()?;
            let mut request = WorkerRequest::get(url).with_method(method).with_destination(destination);
            if let Some(accept) = accept {
                request = request.with_accept(accept);
            }

            let outcome = controller.dispatch(WorkerEvent::Fetch(request)).await?;
            let EventOutcome::Response(response) = outcome else {
                anyhow::bail!("fetch dispatch produced no response");
            };

            if body {
                use std::io::Write;
                std::io::stdout().write_all(&response.body)?;
            } else {
                print_json(&serde_json::json!({
                    "status": response.status.as_u16(),
                    "served_from": response.served_from,
                    "content_type": response.content_type,
                    "bytes": response.body.len(),
                }))?;
            }
        }
        Command::Message { payload } => match controller.dispatch(WorkerEvent::Message(payload)).await? {
            EventOutcome::Activated(report) => print_json(&report)?,
            _ => print_json(&serde_json::json!({ "ignored": true }))?,
        },
        Command::Cache(command) => match command {
            CacheCommand::Get { target, method } => {
                let url = resolve_target(&config, &target)?;
                let key = compute_cache_key(&method.to_uppercase(), url.as_str());
                let order = vec![config.static_generation(), config.dynamic_generation()];
                let entry = store
                    .lookup(&order, &key)
                    .await?
                    .ok_or_else(|| lantern_core::Error::CacheMiss(target.clone()))?;
                print_json(&serde_json::json!({
                    "generation": entry.generation,
                    "key": entry.key,
                    "url": entry.url,
                    "status": entry.status,
                    "content_type": entry.content_type,
                    "stored_at": entry.stored_at,
                    "bytes": entry.body.len(),
                }))?;
            }
            CacheCommand::List => {
                let stats = store.generation_stats().await?;
                print_json(&stats)?;
            }
            CacheCommand::Sweep => {
                let report = controller.activate().await?;
                print_json(&report)?;
            }
        },
    }

    Ok(())
}

/// Absolute paths resolve against the configured origin; anything else is
/// canonicalized as a full URL.
fn resolve_target(config: &AppConfig, target: &str) -> Result<url::Url> {
    if target.starts_with('/') {
        Ok(resolve(&config.origin, target)?)
    } else {
        Ok(canonicalize(target)?)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
