//! Inspirational narrative synthesis with a language-compliance check.

use std::sync::Arc;

use anyhow::Result;
use lorehawk_provider::{CompletionProvider, CompletionRequest};
use lorehawk_schema::{AssistantSummary, LanguageCode, TopicRef};

use crate::analyzer::RawAnalysis;
use crate::language::english_leakage;
use crate::prompts::{pack_for, render};

const INPUT_EXCERPT_CHARS: usize = 1200;

/// Produces the enhanced narrative merged into the final result.
///
/// No fallback content exists here: either the cleaned narrative comes
/// back, or the error propagates as a hard failure.
pub struct FeedbackSynthesizer {
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

impl FeedbackSynthesizer {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn synthesize(
        &self,
        subject: &str,
        input_text: &str,
        refined_score: u8,
        analysis: &RawAnalysis,
        language: &LanguageCode,
    ) -> Result<AssistantSummary> {
        let pack = pack_for(language);
        let excerpt: String = input_text.chars().take(INPUT_EXCERPT_CHARS).collect();
        let request = CompletionRequest::simple(
            self.model.clone(),
            Some(pack.feedback_system.to_string()),
            render(
                pack.feedback_user,
                &[
                    ("subject", subject),
                    ("score", &refined_score.to_string()),
                    ("covered", &topic_names(&analysis.covered_topics)),
                    ("missing", &topic_names(&analysis.missing_topics)),
                    ("assessment", &analysis.feedback),
                    ("input", &excerpt),
                ],
            ),
        )
        .with_temperature(0.9);

        let response = self.provider.complete(request).await?;
        let mut narrative = response.text;

        // One forced re-translation pass when the model ignored the
        // language instruction; the result is accepted either way.
        if english_leakage(&narrative, language) {
            tracing::warn!(language = %language, "feedback opened in the default language, re-translating");
            narrative = self.retranslate(&narrative, language).await?;
        }

        Ok(AssistantSummary {
            enhanced_feedback: clean_narrative(&narrative),
        })
    }

    async fn retranslate(&self, text: &str, language: &LanguageCode) -> Result<String> {
        let pack = pack_for(language);
        let request = CompletionRequest::simple(
            self.model.clone(),
            None,
            render(pack.retranslate_user, &[("text", text)]),
        )
        .with_temperature(0.3);
        let response = self.provider.complete(request).await?;
        Ok(response.text)
    }
}

fn topic_names(topics: &[TopicRef]) -> String {
    if topics.is_empty() {
        return "-".to_string();
    }
    topics
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deterministic cleanup of the narrative: drop bold markers, leading list
/// numbering and bullets, and excess blank lines.
pub fn clean_narrative(text: &str) -> String {
    let without_emphasis = text.replace("**", "").replace("__", "");
    let without_markers = without_emphasis
        .lines()
        .map(strip_list_marker)
        .collect::<Vec<_>>()
        .join("\n");
    collapse_blank_lines(&without_markers).trim().to_string()
}

fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    if let Some(rest) = strip_numbering(trimmed) {
        return rest;
    }
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = trimmed.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    trimmed
}

fn strip_numbering(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    Some(rest.trim_start())
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = text.to_string();
    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }
    out
}
