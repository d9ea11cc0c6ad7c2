//! Language detection and language-compliance checks.

use std::sync::Arc;

use lorehawk_provider::{CompletionProvider, CompletionRequest};
use lorehawk_schema::LanguageCode;

/// Classifies the dominant language of a submission.
///
/// This stage must never fail the request: provider errors and unparseable
/// output both resolve to the default language.
pub struct LanguageDetector {
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

impl LanguageDetector {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn detect(&self, text: &str) -> LanguageCode {
        let sample: String = text.chars().take(500).collect();
        let request = CompletionRequest::simple(
            self.model.clone(),
            Some(
                "You are a language classifier. Identify the dominant language of the text and \
                 answer with its two-letter ISO-639-1 code only, nothing else."
                    .to_string(),
            ),
            sample,
        )
        .with_temperature(0.0)
        .with_max_tokens(8);

        match self.provider.complete(request).await {
            Ok(response) => match LanguageCode::parse(&response.text) {
                Some(code) => code,
                None => {
                    tracing::warn!(raw = %response.text, "unparseable language code, defaulting");
                    LanguageCode::default()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "language detection failed, defaulting");
                LanguageCode::default()
            }
        }
    }
}

/// Resolve the language for an on-demand operation by priority:
/// explicit parameter, then session-remembered, then browser-declared,
/// then the default.
pub fn resolve_language(
    explicit: Option<LanguageCode>,
    remembered: Option<LanguageCode>,
    browser: Option<LanguageCode>,
) -> LanguageCode {
    explicit
        .or(remembered)
        .or(browser)
        .unwrap_or_default()
}

/// Languages whose own text is predominantly Latin script. For these the
/// ASCII-ratio check is useless and leakage is judged by English function
/// words instead.
const LATIN_SCRIPT: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "nl", "pl", "sv", "da", "no", "fi", "ro", "cs", "hu",
    "tr", "id", "ms", "vi", "ca", "hr", "sk", "sl", "et", "lv", "lt",
];

const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "you", "your", "that", "this", "with", "have", "are", "for", "will", "what",
];

/// Length of the response opening examined for leakage.
const OPENING_CHARS: usize = 240;

/// True when a response that should be in `target` opens in English anyway.
///
/// Non-Latin-script targets: fires when ASCII letters dominate the
/// alphabetic characters of the opening. Latin-script targets: fires when
/// the opening contains several distinct high-frequency English function
/// words. Never fires for the default language itself.
pub fn english_leakage(text: &str, target: &LanguageCode) -> bool {
    if target.is_default() {
        return false;
    }
    let opening: String = text.chars().take(OPENING_CHARS).collect();

    if LATIN_SCRIPT.contains(&target.as_str()) {
        let lowered = opening.to_lowercase();
        let distinct = ENGLISH_MARKERS
            .iter()
            .filter(|marker| {
                lowered
                    .split(|c: char| !c.is_ascii_alphabetic())
                    .any(|word| word == **marker)
            })
            .count();
        distinct >= 3
    } else {
        let alphabetic = opening.chars().filter(|c| c.is_alphabetic()).count();
        if alphabetic == 0 {
            return false;
        }
        let ascii = opening.chars().filter(char::is_ascii_alphabetic).count();
        ascii as f64 / alphabetic as f64 >= 0.7
    }
}
