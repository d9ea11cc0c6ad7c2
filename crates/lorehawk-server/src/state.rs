use std::collections::HashMap;
use std::sync::Arc;

use lorehawk_core::AssessmentPipeline;
use lorehawk_schema::LanguageCode;
use lorehawk_store::ResultStore;
use tokio::sync::RwLock;

/// Shared application state accessible from all route handlers.
///
/// The session-language map is the only mutable state: a convenience
/// default for on-demand operations, read-then-write, last-writer-wins.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AssessmentPipeline>,
    pub store: Arc<ResultStore>,
    pub session_languages: Arc<RwLock<HashMap<String, LanguageCode>>>,
}

impl AppState {
    pub fn new(pipeline: Arc<AssessmentPipeline>, store: Arc<ResultStore>) -> Self {
        Self {
            pipeline,
            store,
            session_languages: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn remembered_language(&self, session: Option<&str>) -> Option<LanguageCode> {
        let session = session?;
        self.session_languages.read().await.get(session).cloned()
    }

    pub async fn remember_language(&self, session: Option<&str>, language: &LanguageCode) {
        if let Some(session) = session {
            self.session_languages
                .write()
                .await
                .insert(session.to_string(), language.clone());
        }
    }
}
