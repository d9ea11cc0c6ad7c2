use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Code used when detection fails or nothing else is known.
pub const DEFAULT_LANGUAGE: &str = "en";

/// ISO-639-1-style language code, always lowercase.
///
/// Established once per request and passed explicitly to every downstream
/// stage; there is no ambient "current language" anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse a code out of free-form detector output.
    ///
    /// Takes the leading alphabetic run of the trimmed input ("fr-FR" -> "fr",
    /// "EN." -> "en") and accepts it only if 2-3 letters remain.
    pub fn parse(raw: &str) -> Option<Self> {
        let code: String = raw
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        if (2..=3).contains(&code.len()) {
            Some(Self(code))
        } else {
            None
        }
    }

    pub fn parse_or_default(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LANGUAGE
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LanguageCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LanguageCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_or_default(&raw))
    }
}
