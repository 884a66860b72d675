//! `loopback`: drive the simulator from a shell.
//!
//! State lives in a JSON file under `--storage-dir` (default `.loopback`),
//! so consecutive invocations see each other's writes.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use loopback_api::{Adapter, SimConfig};
use loopback_core::RequestDescriptor;
use loopback_store::seed::DEMO_PASSWORD;
use loopback_store::Collection;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_STORAGE_DIR: &str = ".loopback";

#[derive(Parser)]
#[command(name = "loopback")]
#[command(about = "Offline ERP/HR backend simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the persisted store
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Answer unknown routes with 404 instead of an empty success
    #[arg(long, global = true)]
    strict: bool,

    /// Keep the simulated network latency
    #[arg(long, global = true)]
    latency: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request, e.g. `loopback request GET /api/v1/hr/employees --as admin@acme.com`
    Request {
        method: String,
        url: String,

        /// JSON body
        #[arg(short, long)]
        data: Option<String>,

        /// Bearer token to send
        #[arg(short, long, conflicts_with = "login_as")]
        token: Option<String>,

        /// Log in as a seeded user first and use their token
        #[arg(long = "as", value_name = "EMAIL")]
        login_as: Option<String>,
    },

    /// Log in and print the session
    Login {
        email: String,

        #[arg(short, long, default_value = DEMO_PASSWORD)]
        password: String,
    },

    /// Restore the seeded dataset
    Reset,

    /// Print the persisted store, or one collection of it
    Dump {
        #[arg(short, long)]
        collection: Option<String>,
    },
}

fn build_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = SimConfig::from_env().context("invalid LOOPBACK__ configuration")?;
    let dir = cli
        .storage_dir
        .clone()
        .or_else(|| config.storage_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
    config = config.with_storage_dir(dir);
    if cli.strict {
        config = config.strict();
    }
    if !cli.latency {
        config = config.with_latency(Duration::ZERO, Duration::ZERO);
    }
    Ok(config)
}

fn print(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn login(adapter: &Adapter, email: &str, password: &str) -> Result<Value> {
    let descriptor = RequestDescriptor::post(
        "/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    );
    match adapter.request(descriptor).await {
        Ok(response) => Ok(response.payload().clone()),
        Err(rejection) => {
            print(&serde_json::to_value(&rejection)?)?;
            Err(rejection.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    debug!(?config.storage_dir, strict = config.strict_routes, "starting");
    let adapter = Adapter::from_config(config)?;

    match cli.command {
        Commands::Request {
            method,
            url,
            data,
            token,
            login_as,
        } => {
            let mut descriptor = RequestDescriptor::new(method, url);
            if let Some(raw) = data {
                let body: Value = serde_json::from_str(&raw).context("--data is not valid JSON")?;
                descriptor = descriptor.with_data(body);
            }
            let token = match login_as {
                Some(email) => {
                    let session = login(&adapter, &email, DEMO_PASSWORD).await?;
                    session["accessToken"].as_str().map(str::to_string)
                }
                None => token,
            };
            if let Some(token) = token {
                descriptor = descriptor.bearer(&token);
            }

            match adapter.request(descriptor).await {
                Ok(response) => print(&serde_json::to_value(&response)?)?,
                Err(rejection) => {
                    print(&serde_json::to_value(&rejection)?)?;
                    return Err(rejection.into());
                }
            }
        }
        Commands::Login { email, password } => {
            let session = login(&adapter, &email, &password).await?;
            print(&session)?;
        }
        Commands::Reset => {
            adapter.reset();
            println!("store reset to the seeded dataset");
        }
        Commands::Dump { collection } => {
            let snapshot = adapter.dump();
            match collection {
                Some(name) => {
                    let Some(c) = Collection::from_name(&name) else {
                        bail!("unknown collection: {name}");
                    };
                    print(&Value::Array(snapshot.collection(c).to_vec()))?;
                }
                None => print(&serde_json::to_value(&snapshot)?)?,
            }
        }
    }

    adapter.shutdown();
    Ok(())
}
