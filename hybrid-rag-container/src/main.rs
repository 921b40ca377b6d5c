use std::{env, path::PathBuf, process::ExitCode};

use hybrid_rag::{
    rag_engine::{config::RagConfig, types::RagResult},
    rag_gateway::{bootstrap::build_pipeline, gateway::RagGateway},
};
use mimalloc::MiMalloc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// First CLI argument, then `RAG_CONFIG`, then `./rag.toml`.
fn config_path() -> PathBuf {
    env::args()
        .nth(1)
        .or_else(|| env::var("RAG_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("rag.toml"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

async fn serve() -> RagResult<()> {
    let path = config_path();
    info!(path = %path.display(), "Loading configuration");
    let config = RagConfig::from_file(&path)?;

    let pipeline = build_pipeline(&config)?;
    let gateway = RagGateway::new(&config.server.address, pipeline);
    info!(address = gateway.address(), "Starting hybrid RAG server");

    gateway.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    match serve().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server exited with error");
            ExitCode::FAILURE
        }
    }
}
