//! Audio normalization: turn a recording into text, or reject it.

use std::sync::Arc;

use anyhow::anyhow;
use lorehawk_provider::{SpeechProvider, TranscriptionRequest};

use crate::error::AssessError;

/// Recordings below this size carry no usable speech.
pub const MIN_AUDIO_BYTES: usize = 1000;

/// Converts recorded audio into text via the speech-to-text service.
///
/// There is no fallback transcript: accuracy here cannot be faked, so both
/// failure modes are terminal for the request and carry distinct
/// user-facing messages.
pub struct SpeechNormalizer {
    provider: Option<Arc<dyn SpeechProvider>>,
    model: String,
}

impl SpeechNormalizer {
    pub fn new(provider: Option<Arc<dyn SpeechProvider>>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn normalize(&self, audio: &[u8], mime_type: &str) -> Result<String, AssessError> {
        if audio.len() < MIN_AUDIO_BYTES {
            return Err(AssessError::RecordingTooShort);
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            AssessError::AudioUnprocessable(anyhow!("transcription service not configured"))
        })?;

        let text = provider
            .transcribe(TranscriptionRequest {
                audio: audio.to_vec(),
                mime_type: mime_type.to_string(),
                model: self.model.clone(),
            })
            .await
            .map_err(AssessError::AudioUnprocessable)?;

        if text.trim().is_empty() {
            return Err(AssessError::AudioUnprocessable(anyhow!(
                "transcription returned no speech"
            )));
        }
        Ok(text)
    }
}
