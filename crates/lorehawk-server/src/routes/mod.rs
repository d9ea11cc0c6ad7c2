pub mod assessments;
pub mod health;
pub mod timeline;
pub mod topics;

use axum::Router;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/assessments", assessments::router())
        .nest("/topics", topics::router())
        .nest("/timeline", timeline::router())
        .nest("/health", health::router())
}
