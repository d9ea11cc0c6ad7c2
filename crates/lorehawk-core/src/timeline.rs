//! Subject timeline synthesis with per-language fallback tables.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use lorehawk_provider::{CompletionProvider, CompletionRequest};
use lorehawk_schema::{LanguageCode, TimelineEvent, DEFAULT_LANGUAGE};
use serde_json::Value;

use crate::decode::{extract_json_block, string_field};
use crate::prompts::{pack_for, render};

/// A timeline is always exactly this many events.
pub const TIMELINE_LEN: usize = 6;

static FALLBACK_TIMELINES: OnceLock<HashMap<String, Vec<TimelineEvent>>> = OnceLock::new();

const FALLBACK_ASSET: &str = include_str!("../assets/fallback_timelines.yaml");

/// Pre-authored tables, parsed once per process from the embedded asset.
fn fallback_tables() -> &'static HashMap<String, Vec<TimelineEvent>> {
    FALLBACK_TIMELINES.get_or_init(|| {
        serde_yaml::from_str(FALLBACK_ASSET).expect("embedded fallback timelines must parse")
    })
}

/// The fallback timeline for a language; unknown codes use the default
/// language's table.
pub fn fallback_timeline(language: &LanguageCode) -> Vec<TimelineEvent> {
    let tables = fallback_tables();
    tables
        .get(language.as_str())
        .or_else(|| tables.get(DEFAULT_LANGUAGE))
        .cloned()
        .unwrap_or_default()
}

/// Requests a 6-event historical timeline for a subject. This stage never
/// raises an error: any failure or unusable result is answered from the
/// fallback tables.
pub struct TimelineSynthesizer {
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

impl TimelineSynthesizer {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn generate(&self, subject: &str, language: &LanguageCode) -> Vec<TimelineEvent> {
        let pack = pack_for(language);
        let request = CompletionRequest::simple(
            self.model.clone(),
            Some(pack.timeline_system.to_string()),
            render(pack.timeline_user, &[("subject", subject)]),
        )
        .with_temperature(0.7)
        .with_json_output();

        match self.provider.complete(request).await {
            Ok(response) => {
                let mut events = parse_events(&response.text);
                if events.len() >= TIMELINE_LEN {
                    events.truncate(TIMELINE_LEN);
                    events
                } else {
                    tracing::warn!(
                        subject,
                        valid = events.len(),
                        "timeline response incomplete, using fallback"
                    );
                    fallback_timeline(language)
                }
            }
            Err(err) => {
                tracing::warn!(subject, error = %err, "timeline synthesis failed, using fallback");
                fallback_timeline(language)
            }
        }
    }
}

/// Pull well-formed events out of model output, dropping entries missing
/// any field. Accepts a bare array or an object with an `events` array.
fn parse_events(text: &str) -> Vec<TimelineEvent> {
    let Some(block) = extract_json_block(text) else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(block) else {
        return Vec::new();
    };
    let items = match &value {
        Value::Array(items) => items.clone(),
        Value::Object(_) => value
            .get("events")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    items.iter().filter_map(parse_event).collect()
}

fn parse_event(value: &Value) -> Option<TimelineEvent> {
    let year = match value.get("year") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return None,
    };
    Some(TimelineEvent {
        year,
        title: string_field(value, "title")?,
        description: string_field(value, "description")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct FixedProvider(Result<String, String>);

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<lorehawk_provider::CompletionResponse> {
            match &self.0 {
                Ok(text) => Ok(lorehawk_provider::CompletionResponse {
                    text: text.clone(),
                    input_tokens: None,
                    output_tokens: None,
                    stop_reason: None,
                }),
                Err(message) => Err(anyhow!(message.clone())),
            }
        }
    }

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::parse(code).unwrap()
    }

    fn live_events(count: usize) -> String {
        let events: Vec<Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "year": format!("19{:02}", i),
                    "title": format!("Event {i}"),
                    "description": format!("Description {i}")
                })
            })
            .collect();
        serde_json::to_string(&events).unwrap()
    }

    #[test]
    fn every_fallback_table_has_exactly_six_events() {
        for (code, events) in fallback_tables() {
            assert_eq!(events.len(), TIMELINE_LEN, "table for {code}");
            for event in events {
                assert!(!event.year.is_empty());
                assert!(!event.title.is_empty());
                assert!(!event.description.is_empty());
            }
        }
        assert!(fallback_tables().contains_key("en"));
    }

    #[test]
    fn unknown_language_falls_back_to_default_table() {
        let unknown = fallback_timeline(&lang("xx"));
        let default = fallback_timeline(&LanguageCode::default());
        assert_eq!(unknown, default);
        assert_eq!(unknown.len(), TIMELINE_LEN);
    }

    #[test]
    fn localized_tables_differ_from_default() {
        let es = fallback_timeline(&lang("es"));
        let en = fallback_timeline(&LanguageCode::default());
        assert_ne!(es, en);
        assert_eq!(es.len(), TIMELINE_LEN);
    }

    #[tokio::test]
    async fn live_path_returns_exactly_six() {
        let synth =
            TimelineSynthesizer::new(Arc::new(FixedProvider(Ok(live_events(6)))), "m");
        let events = synth.generate("Physics", &LanguageCode::default()).await;
        assert_eq!(events.len(), TIMELINE_LEN);
        assert_eq!(events[0].title, "Event 0");
    }

    #[tokio::test]
    async fn oversized_response_is_truncated() {
        let synth =
            TimelineSynthesizer::new(Arc::new(FixedProvider(Ok(live_events(9)))), "m");
        let events = synth.generate("Physics", &LanguageCode::default()).await;
        assert_eq!(events.len(), TIMELINE_LEN);
        assert_eq!(events[5].title, "Event 5");
    }

    #[tokio::test]
    async fn incomplete_response_uses_fallback() {
        let synth =
            TimelineSynthesizer::new(Arc::new(FixedProvider(Ok(live_events(3)))), "m");
        let events = synth.generate("Physics", &LanguageCode::default()).await;
        assert_eq!(events, fallback_timeline(&LanguageCode::default()));
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback_for_requested_language() {
        let synth =
            TimelineSynthesizer::new(Arc::new(FixedProvider(Err("down".into()))), "m");
        let events = synth.generate("Historia", &lang("es")).await;
        assert_eq!(events, fallback_timeline(&lang("es")));
        assert_eq!(events.len(), TIMELINE_LEN);
    }

    #[tokio::test]
    async fn garbage_response_uses_fallback() {
        let synth = TimelineSynthesizer::new(
            Arc::new(FixedProvider(Ok("I don't know any history".into()))),
            "m",
        );
        let events = synth.generate("Physics", &LanguageCode::default()).await;
        assert_eq!(events.len(), TIMELINE_LEN);
    }

    #[test]
    fn parse_events_drops_malformed_entries() {
        let raw = r#"[
            {"year": "1905", "title": "Relativity", "description": "Annus mirabilis"},
            {"year": "1920", "title": "", "description": "empty title"},
            {"title": "No year", "description": "dropped"},
            {"year": 1953, "title": "DNA", "description": "Double helix"}
        ]"#;
        let events = parse_events(raw);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Relativity");
        assert_eq!(events[1].year, "1953");
    }

    #[test]
    fn parse_events_accepts_wrapped_object() {
        let raw = r#"{"events": [{"year": "Present", "title": "Now", "description": "d"}]}"#;
        let events = parse_events(raw);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].year, "Present");
    }
}
