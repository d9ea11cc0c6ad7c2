use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use lorehawk_schema::{LanguageCode, TimelineEvent};
use serde::Deserialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(generate_timeline))
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub subject: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

/// First language tag of an Accept-Language header, reduced to its primary
/// subtag.
pub(crate) fn browser_language(headers: &HeaderMap) -> Option<LanguageCode> {
    let raw = headers.get("accept-language")?.to_str().ok()?;
    let first = raw.split(',').next()?.split(';').next()?.trim();
    LanguageCode::parse(first)
}

async fn generate_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
    headers: HeaderMap,
) -> Json<Vec<TimelineEvent>> {
    let language = lorehawk_core::resolve_language(
        query.lang.as_deref().and_then(LanguageCode::parse),
        state.remembered_language(query.session.as_deref()).await,
        browser_language(&headers),
    );
    let events = state
        .pipeline
        .generate_timeline(&query.subject, &language)
        .await;
    Json(events)
}
