//! Knowledge analysis: the one structured call with no safe fallback.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use lorehawk_provider::{CompletionProvider, CompletionRequest};
use lorehawk_schema::{LanguageCode, TopicCoverage, TopicRef};
use serde_json::Value;

use crate::decode::{clamp_percentage, coerce_score, extract_json_block, string_field};
use crate::prompts::{analysis_system_prompt, pack_for, render};

/// What the completion service says about a submission, after boundary
/// coercion: collections are never null, the score is always 0-100.
#[derive(Debug, Clone)]
pub struct RawAnalysis {
    pub score: u8,
    pub covered_topics: Vec<TopicRef>,
    pub missing_topics: Vec<TopicRef>,
    pub topic_coverage: Vec<TopicCoverage>,
    pub feedback: String,
}

pub struct KnowledgeAnalyzer {
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

impl KnowledgeAnalyzer {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Analyze a submission. Upstream failure is a hard error: there is no
    /// honest substitute for "what does this text mean".
    pub async fn analyze(
        &self,
        subject: &str,
        text: &str,
        language: &LanguageCode,
    ) -> Result<RawAnalysis> {
        let pack = pack_for(language);
        let request = CompletionRequest::simple(
            self.model.clone(),
            Some(analysis_system_prompt(pack)),
            render(pack.analysis_user, &[("subject", subject), ("input", text)]),
        )
        .with_temperature(0.3)
        .with_json_output();

        let response = self.provider.complete(request).await?;
        let analysis = decode_analysis(&response.text)?;

        if !analysis.topic_coverage.is_empty()
            && analysis.topic_coverage.iter().all(|c| c.percentage == 100)
        {
            tracing::warn!(subject, "analyzer reported uniform 100% coverage");
        }
        Ok(analysis)
    }
}

/// Decode the analysis envelope leniently: malformed or absent collections
/// become empty, a non-numeric score becomes 0. Only an envelope with no
/// JSON at all is an error.
fn decode_analysis(text: &str) -> Result<RawAnalysis> {
    let block = extract_json_block(text)
        .ok_or_else(|| anyhow!("analysis response contained no JSON"))?;
    let value: Value = serde_json::from_str(block)
        .map_err(|e| anyhow!("analysis response was not valid JSON: {e}"))?;

    Ok(RawAnalysis {
        score: value.get("score").map(coerce_score).unwrap_or(0),
        covered_topics: parse_topic_refs(value.get("covered_topics")),
        missing_topics: parse_topic_refs(value.get("missing_topics")),
        topic_coverage: parse_coverages(value.get("topic_coverage")),
        feedback: string_field(&value, "feedback").unwrap_or_default(),
    })
}

fn parse_topic_refs(value: Option<&Value>) -> Vec<TopicRef> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = string_field(item, "name")?;
            let description = string_field(item, "description").unwrap_or_default();
            Some(TopicRef { name, description })
        })
        .collect()
}

fn parse_coverages(value: Option<&Value>) -> Vec<TopicCoverage> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = string_field(item, "name")?;
            let percentage = item.get("percentage").and_then(Value::as_f64)?;
            Some(TopicCoverage {
                name,
                percentage: clamp_percentage(percentage),
            })
        })
        .collect()
}
