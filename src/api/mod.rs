pub mod error;
pub mod routes;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::tasks::TaskOrchestrator;

pub use error::ApiError;
pub use routes::{AppState, TaskResponse};

pub fn build_app(orchestrator: TaskOrchestrator) -> Router {
    let routes = routes::router(AppState { orchestrator });

    Router::new()
        .nest("/api", routes.clone())
        .merge(routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(addr: &str, orchestrator: TaskOrchestrator) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, build_app(orchestrator)).await?;
    Ok(())
}
