pub mod routes;
pub mod state;

use anyhow::Result;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("lorehawk-server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorehawk_core::{AssessmentPipeline, PipelineOptions};
    use lorehawk_provider::StubProvider;
    use lorehawk_store::ResultStore;
    use std::sync::Arc;

    #[test]
    fn router_builds_with_stub_state() {
        let pipeline = Arc::new(AssessmentPipeline::new(
            Arc::new(StubProvider),
            None,
            PipelineOptions::default(),
        ));
        let store = Arc::new(ResultStore::open_in_memory().unwrap());
        let _router = create_router(AppState::new(pipeline, store));
    }
}
