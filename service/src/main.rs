//! `openapi-kit` entry-point: serves the API or prints its OpenAPI document.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use mockable::DefaultEnv;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use openapi_kit::ServiceSettings;
use openapi_kit::inbound::http::spec::SpecDocument;
use openapi_kit::server::{self, AppState};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "openapi-kit", about = "JSON micro-service with an OpenAPI document", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP and WebSocket server.
    Serve {
        /// Interface to bind; overrides `MICRO_SERVICE_HOST`.
        #[arg(long)]
        host: Option<String>,
        /// Port to bind; overrides `MICRO_SERVICE_PORT`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the OpenAPI document as JSON.
    Spec,
    /// Print the package version.
    Version,
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    match Cli::parse().command {
        Command::Serve { host, port } => {
            let settings = ServiceSettings::from_env(&DefaultEnv::default())
                .wrap_err("invalid environment")?
                .with_bind_addr(host, port);
            let state = AppState::build(&settings).wrap_err("failed to build application state")?;
            server::run(state).await.wrap_err("server failed")?;
        }
        Command::Spec => {
            let document = SpecDocument::build().wrap_err("failed to render the OpenAPI document")?;
            let text = serde_json::to_string_pretty(document.as_json())?;
            println!("{text}");
        }
        Command::Version => println!("{}", env!("CARGO_PKG_VERSION")),
    }
    Ok(())
}
