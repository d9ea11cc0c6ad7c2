//! Per-topic enrichment with isolated failure boundaries.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use lorehawk_provider::{CompletionProvider, CompletionRequest};
use lorehawk_schema::{EnrichedTopic, LanguageCode, TopicRef};
use serde_json::Value;

use crate::decode::{extract_json_block, string_field};
use crate::prompts::{pack_for, render};

const MAX_KEY_POINTS: usize = 5;

pub struct TopicEnricher {
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

impl TopicEnricher {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Expand one missing topic. Never errors: a failed request degrades to
    /// the language pack's placeholder content for this topic only.
    pub async fn explain_topic(
        &self,
        subject: &str,
        topic: &TopicRef,
        language: &LanguageCode,
    ) -> EnrichedTopic {
        match self.request_explanation(subject, topic, language).await {
            Ok((overview, key_points)) => EnrichedTopic {
                name: topic.name.clone(),
                description: topic.description.clone(),
                overview,
                key_points,
            },
            Err(err) => {
                tracing::warn!(topic = %topic.name, error = %err, "topic enrichment failed");
                let pack = pack_for(language);
                EnrichedTopic {
                    name: topic.name.clone(),
                    description: topic.description.clone(),
                    overview: pack.placeholder_overview.to_string(),
                    key_points: vec![pack.placeholder_key_point.to_string()],
                }
            }
        }
    }

    /// Enrich every missing topic concurrently. A single failing topic
    /// never aborts the batch; order is preserved.
    pub async fn enrich_all(
        &self,
        subject: &str,
        topics: &[TopicRef],
        language: &LanguageCode,
    ) -> Vec<EnrichedTopic> {
        let tasks = topics
            .iter()
            .map(|topic| self.explain_topic(subject, topic, language));
        join_all(tasks).await
    }

    async fn request_explanation(
        &self,
        subject: &str,
        topic: &TopicRef,
        language: &LanguageCode,
    ) -> Result<(String, Vec<String>)> {
        let pack = pack_for(language);
        let request = CompletionRequest::simple(
            self.model.clone(),
            Some(pack.topic_system.to_string()),
            render(
                pack.topic_user,
                &[
                    ("subject", subject),
                    ("topic", &topic.name),
                    ("description", &topic.description),
                ],
            ),
        )
        .with_temperature(0.7)
        .with_max_tokens(1024)
        .with_json_output();

        let response = self.provider.complete(request).await?;
        decode_explanation(&response.text)
    }
}

fn decode_explanation(text: &str) -> Result<(String, Vec<String>)> {
    let block = extract_json_block(text)
        .ok_or_else(|| anyhow!("explanation response contained no JSON"))?;
    let value: Value = serde_json::from_str(block)
        .map_err(|e| anyhow!("explanation response was not valid JSON: {e}"))?;

    let overview = string_field(&value, "overview")
        .ok_or_else(|| anyhow!("explanation is missing an overview"))?;
    let key_points: Vec<String> = value
        .get("key_points")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .take(MAX_KEY_POINTS)
                .collect()
        })
        .unwrap_or_default();

    if key_points.is_empty() {
        return Err(anyhow!("explanation has no usable key points"));
    }
    Ok((overview, key_points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails for topics whose name appears in the poison list; answers the
    /// rest.
    struct SelectiveProvider {
        poison: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for SelectiveProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<lorehawk_provider::CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prompt = &request.messages[0].content;
            if prompt.contains(self.poison) {
                return Err(anyhow!("upstream failure"));
            }
            Ok(lorehawk_provider::CompletionResponse {
                text: r#"{"overview": "A short overview.", "key_points": ["p1", "p2", "p3"]}"#
                    .into(),
                input_tokens: None,
                output_tokens: None,
                stop_reason: None,
            })
        }
    }

    fn topic(name: &str) -> TopicRef {
        TopicRef {
            name: name.into(),
            description: format!("About {name}"),
        }
    }

    #[tokio::test]
    async fn failing_topic_does_not_poison_batch() {
        let provider = Arc::new(SelectiveProvider {
            poison: "Electromagnetism",
            calls: AtomicUsize::new(0),
        });
        let enricher = TopicEnricher::new(provider.clone(), "m");
        let topics = vec![
            topic("Thermodynamics"),
            topic("Electromagnetism"),
            topic("Optics"),
        ];

        let enriched = enricher
            .enrich_all("Physics", &topics, &LanguageCode::default())
            .await;

        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[0].overview, "A short overview.");
        assert_eq!(enriched[1].overview, "Overview unavailable");
        assert_eq!(
            enriched[1].key_points,
            vec!["Explanation could not be generated".to_string()]
        );
        assert_eq!(enriched[2].overview, "A short overview.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn placeholders_are_localized() {
        let provider = Arc::new(SelectiveProvider {
            poison: "Termodinámica",
            calls: AtomicUsize::new(0),
        });
        let enricher = TopicEnricher::new(provider, "m");
        let lang = LanguageCode::parse("es").unwrap();

        let enriched = enricher
            .explain_topic("Física", &topic("Termodinámica"), &lang)
            .await;

        assert_eq!(enriched.overview, "Resumen no disponible");
        assert_eq!(enriched.key_points[0], "No se pudo generar la explicación");
    }

    #[tokio::test]
    async fn empty_topic_list_makes_no_calls() {
        let provider = Arc::new(SelectiveProvider {
            poison: "nothing",
            calls: AtomicUsize::new(0),
        });
        let enricher = TopicEnricher::new(provider.clone(), "m");
        let enriched = enricher
            .enrich_all("Physics", &[], &LanguageCode::default())
            .await;
        assert!(enriched.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn decode_truncates_key_points() {
        let raw = r#"{"overview": "o", "key_points": ["1","2","3","4","5","6","7"]}"#;
        let (_, points) = decode_explanation(raw).unwrap();
        assert_eq!(points.len(), MAX_KEY_POINTS);
    }

    #[test]
    fn decode_rejects_missing_overview_or_points() {
        assert!(decode_explanation(r#"{"key_points": ["a"]}"#).is_err());
        assert!(decode_explanation(r#"{"overview": "o", "key_points": []}"#).is_err());
        assert!(decode_explanation(r#"{"overview": "o"}"#).is_err());
        assert!(decode_explanation("no json here").is_err());
    }
}
