pub mod language;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use language::{LanguageCode, DEFAULT_LANGUAGE};

/// How the submission arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Audio,
}

/// Raw submission payload before normalization.
#[derive(Debug, Clone)]
pub enum RawInput {
    Text(String),
    Audio { bytes: Vec<u8>, mime_type: String },
}

impl RawInput {
    pub fn kind(&self) -> InputKind {
        match self {
            Self::Text(_) => InputKind::Text,
            Self::Audio { .. } => InputKind::Audio,
        }
    }
}

/// One assessment submission. Created per call, never mutated.
#[derive(Debug, Clone)]
pub struct AssessmentRequest {
    pub subject: String,
    pub input: RawInput,
}

/// A subject topic, used for both covered and missing sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A missing topic expanded with an overview and key points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedTopic {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub overview: String,
    pub key_points: Vec<String>,
}

/// Per-topic coverage percentage, 0-100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCoverage {
    pub name: String,
    pub percentage: u8,
}

/// Fully-assembled assessment. Persisted once after construction; the
/// pipeline hands it off and never touches it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: Uuid,
    pub subject: String,
    pub language: LanguageCode,
    pub score: u8,
    pub covered_topics: Vec<TopicRef>,
    pub missing_topics: Vec<EnrichedTopic>,
    pub topic_coverage: Vec<TopicCoverage>,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

impl AssessmentResult {
    /// Fold an independently-produced summary into the result, consuming it.
    /// This is the only sanctioned way the narrative changes after analysis.
    pub fn merge_summary(mut self, summary: AssistantSummary) -> Self {
        self.feedback = summary.enhanced_feedback;
        self
    }
}

/// One event in a subject timeline. `year` is free-form: "1905",
/// "c. 1600-1700", "Present".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub year: String,
    pub title: String,
    pub description: String,
}

/// Narrative produced by the feedback synthesizer, merged into the
/// assessment result by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantSummary {
    pub enhanced_feedback: String,
}
