use clap::{Parser, Subcommand};
use std::sync::Arc;
use teams_resolver::cache::{
    CacheKeyBuilder, CacheNamespace, Cacher, JsonFileCache, KeyPart, Pepper,
};
use teams_resolver::config::{CacheProvider, Settings, load_settings};
use teams_resolver::error::Result;
use tracing_subscriber::EnvFilter;

/// Inspect and maintain the Teams reference cache
#[derive(Debug, Parser)]
#[command(name = "teams-resolver", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the cache file location
    Path,
    /// Print every cached key and its IDs
    Show,
    /// Print the IDs stored under a key
    Get { key: String },
    /// Remove one key
    Invalidate { key: String },
    /// Remove every key
    Clear,
    /// Print the cache key for a namespace and parts; prefix a part with
    /// `hash:` to treat it as an email or UPN
    Key {
        namespace: CacheNamespace,
        #[arg(required = true)]
        parts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("teams_resolver=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();
    let settings = load_settings()?;
    tracing::debug!(
        mode = ?settings.cache.mode,
        path = %settings.cache.path.display(),
        "Configuration loaded"
    );

    match cli.command {
        Command::Path => println!("{}", settings.cache.path.display()),
        Command::Show => {
            let entries = open_store(&settings).snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Get { key } => match open_store(&settings).get(&key).await? {
            Some(ids) => println!("{}", ids.join("\n")),
            None => tracing::info!(cache_key = %key, "Key is not cached"),
        },
        Command::Invalidate { key } => {
            open_store(&settings).invalidate(&key).await?;
            tracing::info!(cache_key = %key, "Cache entry removed");
        }
        Command::Clear => {
            open_store(&settings).clear().await?;
            tracing::info!("Cache cleared");
        }
        Command::Key { namespace, parts } => {
            let pepper = Pepper::configured(settings.resolver.pepper.as_deref());
            let keys = CacheKeyBuilder::new(Arc::new(pepper));
            let parts: Vec<KeyPart<'_>> = parts
                .iter()
                .map(|part| match part.strip_prefix("hash:") {
                    Some(identity) => KeyPart::Identity(identity),
                    None => KeyPart::Plain(part),
                })
                .collect();
            println!("{}", keys.build(namespace, &parts));
        }
    }

    Ok(())
}

fn open_store(settings: &Settings) -> JsonFileCache {
    match settings.cache.provider {
        CacheProvider::JsonFile => JsonFileCache::new(settings.cache.path.clone()),
    }
}
