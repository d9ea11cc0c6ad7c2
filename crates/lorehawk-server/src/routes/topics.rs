use axum::{extract::State, routing::post, Json, Router};
use lorehawk_schema::{EnrichedTopic, LanguageCode};
use serde::Deserialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/explain", post(explain_topic))
}

#[derive(Debug, Deserialize)]
pub struct ExplainBody {
    pub subject: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

async fn explain_topic(
    State(state): State<AppState>,
    Json(body): Json<ExplainBody>,
) -> Json<EnrichedTopic> {
    let language = lorehawk_core::resolve_language(
        body.language.as_deref().and_then(LanguageCode::parse),
        state.remembered_language(body.session.as_deref()).await,
        None,
    );
    let topic = state
        .pipeline
        .explain_topic(&body.subject, &body.name, &body.description, &language)
        .await;
    Json(topic)
}
