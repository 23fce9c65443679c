//! CloudCache command-line client
//!
//! Thin wrapper over [`CacheClient`] for poking at a cache from a shell.
//! Values are sent and printed in raw encoding.

use clap::{Parser, Subcommand};
use cloudcache::config::Config;
use cloudcache::{CacheClient, Encoding};
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CloudCache CLI
#[derive(Parser, Debug)]
#[command(name = "cloudcache")]
#[command(about = "CLI for the CloudCache hosted cache service")]
struct Args {
    /// TOML config file (defaults to CLOUDCACHE_* env vars)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the credential is accepted
    Auth,

    /// Get a value by key
    Get {
        key: String,
    },

    /// Store a value
    Put {
        key: String,

        value: String,

        /// Seconds until expiry (0 = never)
        #[arg(long, default_value_t = 0)]
        ttl: u64,
    },

    /// Delete a key
    Delete {
        key: String,
    },

    /// Increment a counter
    Incr {
        key: String,

        #[arg(default_value_t = 1)]
        delta: i64,

        /// Create the counter with this value when absent
        #[arg(long)]
        set_if_not_found: Option<i64>,
    },

    /// Decrement a counter
    Decr {
        key: String,

        #[arg(default_value_t = 1)]
        delta: i64,

        /// Create the counter with this value when absent
        #[arg(long)]
        set_if_not_found: Option<i64>,
    },

    /// List every key in the account
    Keys,

    /// Show the account usage counter
    Usage,

    /// Remove every key in the account
    Flush,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from {}", config_path);
        Config::from_file(config_path)?
    } else {
        Config::from_env()
    };
    config.validate()?;

    let runtime = Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(config, args.command))
}

async fn run(config: Config, command: Commands) -> anyhow::Result<()> {
    let mut client = CacheClient::from_config(&config)?;

    // Release the transport whether or not the command succeeded
    let result = dispatch(&client, command).await;
    client.shutdown();
    result
}

async fn dispatch(client: &CacheClient, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Auth => {
            client.auth().await?;
            println!("OK");
        }
        Commands::Get { key } => match client.get::<String>(&key, Encoding::Raw).await? {
            Some(value) => println!("{value}"),
            None => println!("(not found)"),
        },
        Commands::Put { key, value, ttl } => {
            client.put(&key, value.as_str(), ttl, Encoding::Raw).await?;
            println!("OK");
        }
        Commands::Delete { key } => {
            let removed = client.delete(&key).await?;
            println!("{}", if removed { "DELETED" } else { "NOT_FOUND" });
        }
        Commands::Incr {
            key,
            delta,
            set_if_not_found,
        } => {
            println!("{}", client.increment(&key, delta, set_if_not_found).await?);
        }
        Commands::Decr {
            key,
            delta,
            set_if_not_found,
        } => {
            println!("{}", client.decrement(&key, delta, set_if_not_found).await?);
        }
        Commands::Keys => {
            for key in client.list_keys().await? {
                println!("{key}");
            }
        }
        Commands::Usage => println!("{}", client.usage().await?),
        Commands::Flush => println!("{}", client.flush().await?),
    }

    Ok(())
}
