use std::{sync::Arc, time::Instant};

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{info, trace, warn};

use crate::{
    protocol::{HealthResponse, QueryError, QueryRequest, QueryResponse},
    rag_engine::{
        pipeline::Pipeline,
        types::{RagError, RagResult},
    },
};

pub struct RagGateway {
    address: String,
    pipeline: Arc<Pipeline>,
}

impl RagGateway {
    pub fn new(address: &str, pipeline: Pipeline) -> RagGateway {
        RagGateway {
            address: address.to_string(),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn run(self) -> RagResult<()> {
        trace!("Starting RAG Gateway");

        let app = router(Arc::clone(&self.pipeline));

        let listener = tokio::net::TcpListener::bind(&self.address).await?;
        info!(address = %self.address, "Listener has been bound, starting server");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

pub fn router(pipeline: Arc<Pipeline>) -> axum::Router {
    axum::Router::new()
        .route("/query", post(query_handler))
        .route("/health", get(health_handler))
        .with_state(pipeline)
}

async fn query_handler(
    State(pipeline): State<Arc<Pipeline>>,
    request: Result<QueryRequest, QueryError>,
) -> axum::response::Response {
    let request = match request {
        Ok(r) => r,
        Err(e) => {
            info!(?e, "Rejected request");
            return e.into_response();
        }
    };

    let start_time = Instant::now();
    match pipeline.run(&request.question).await {
        Ok(result) => {
            trace!(
                time_taken_usec = start_time.elapsed().as_micros() as u64,
                "Query served"
            );
            QueryResponse::from(result).into_response()
        }
        Err(e) => {
            if matches!(e, RagError::Timeout { .. }) || e.is_collaborator_failure() {
                warn!(error = %e, "Query failed");
            } else {
                info!(?e, "Got error");
            }
            QueryError::from(e).into_response()
        }
    }
}

async fn health_handler(State(pipeline): State<Arc<Pipeline>>) -> HealthResponse {
    let config = pipeline.config();
    HealthResponse {
        status: "ok".to_string(),
        retrieve_k: config.retrieve_k,
        rerank_k: config.rerank_k,
    }
}

async fn shutdown_signal() {
    // Respond to either Ctrl-C (SIGINT) or SIGTERM (e.g. `kill` or systemd stop)
    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, starting graceful shutdown…");
            }
            _ = sigterm() => {
                info!("Received SIGTERM, starting graceful shutdown…");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl-C, starting graceful shutdown…");
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Could not install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}
