use thiserror::Error;

/// Failures that terminate an assessment request.
///
/// Soft failures (language detection, topic enrichment, timeline synthesis)
/// never appear here; they resolve locally to fallback content. The variants
/// below are the honest failures: fabricating a score or a transcript would
/// be worse than reporting them.
#[derive(Debug, Error)]
pub enum AssessError {
    #[error("subject must not be empty")]
    EmptySubject,

    #[error("submission must not be empty")]
    EmptyInput,

    #[error("the recording is too short or empty, please record again")]
    RecordingTooShort,

    #[error("could not process the audio recording")]
    AudioUnprocessable(#[source] anyhow::Error),

    #[error("knowledge analysis failed")]
    Analysis(#[source] anyhow::Error),

    #[error("feedback generation failed")]
    Feedback(#[source] anyhow::Error),

    #[error("failed to persist assessment result")]
    Store(#[source] anyhow::Error),
}

impl AssessError {
    /// True for upstream failures worth retrying; input validation and
    /// degenerate recordings are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Analysis(_) | Self::Feedback(_) | Self::AudioUnprocessable(_) | Self::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn validation_errors_are_not_retryable() {
        assert!(!AssessError::EmptySubject.is_retryable());
        assert!(!AssessError::EmptyInput.is_retryable());
        assert!(!AssessError::RecordingTooShort.is_retryable());
    }

    #[test]
    fn upstream_errors_are_retryable() {
        assert!(AssessError::Analysis(anyhow!("x")).is_retryable());
        assert!(AssessError::Feedback(anyhow!("x")).is_retryable());
    }

    #[test]
    fn messages_distinguish_speech_outcomes() {
        let short = AssessError::RecordingTooShort.to_string();
        let bad = AssessError::AudioUnprocessable(anyhow!("x")).to_string();
        assert!(short.contains("too short"));
        assert!(bad.contains("could not process"));
        assert_ne!(short, bad);
    }
}
