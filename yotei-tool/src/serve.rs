use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};
use yotei_core::{Oracle, Pipeline};

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
}

pub fn router<O>(pipeline: Arc<Pipeline<O>>) -> Router
where
    O: Oracle + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(healthz))
        .route("/process/", post(process::<O>))
        .with_state(pipeline)
}

pub async fn run<O>(pipeline: Pipeline<O>, listen: &str) -> std::io::Result<()>
where
    O: Oracle + Send + Sync + 'static,
{
    let app = router(Arc::new(pipeline));
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn process<O>(
    State(pipeline): State<Arc<Pipeline<O>>>,
    Json(request): Json<ProcessRequest>,
) -> (StatusCode, Json<Value>)
where
    O: Oracle + Send + Sync + 'static,
{
    match pipeline.process(&request.text).await {
        Ok(output) => (StatusCode::OK, Json(json!({ "result": output }))),
        Err(e) => {
            error!(error = %e, "pipeline failed");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() })))
        }
    }
}
