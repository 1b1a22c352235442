use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use gql_transport::config::{load_config, ServiceConfig};
use gql_transport::graphql::StaticExecutor;
use gql_transport::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "gql-transport")]
#[command(about = "GraphQL HTTP transport server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!("gql-transport v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.listener.endpoint,
        max_upload_size = config.upload.max_upload_size(),
        max_memory = config.upload.max_memory(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let executor = Arc::new(StaticExecutor::new(config.schema.fields.clone()));
    gql_transport::lifecycle::run(config, executor).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
