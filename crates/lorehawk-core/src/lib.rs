pub mod analyzer;
pub mod config;
mod decode;
pub mod enrich;
pub mod error;
pub mod feedback;
pub mod language;
pub mod pipeline;
pub mod prompts;
pub mod refine;
pub mod speech;
pub mod timeline;

pub use analyzer::{KnowledgeAnalyzer, RawAnalysis};
pub use config::{load_config, validate_config, LorehawkConfig};
pub use enrich::TopicEnricher;
pub use error::AssessError;
pub use feedback::{clean_narrative, FeedbackSynthesizer};
pub use language::{english_leakage, resolve_language, LanguageDetector};
pub use pipeline::{AssessmentPipeline, PipelineOptions};
pub use refine::{refine, word_count};
pub use speech::{SpeechNormalizer, MIN_AUDIO_BYTES};
pub use timeline::{fallback_timeline, TimelineSynthesizer, TIMELINE_LEN};
