use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use lorehawk_core::AssessError;
use lorehawk_schema::{AssessmentRequest, AssessmentResult, InputKind, RawInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assessment))
        .route("/{id}", get(get_assessment))
}

#[derive(Debug, Deserialize)]
pub struct AssessBody {
    pub subject: String,
    #[serde(default)]
    pub input_kind: Option<InputKind>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub audio_mime: Option<String>,
    /// Opaque session key; used only to remember the detected language as a
    /// convenience default for later on-demand operations.
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub retryable: bool,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
            retryable: false,
        }),
    )
}

pub(crate) fn assess_error_response(err: AssessError) -> ApiError {
    let status = match &err {
        AssessError::EmptySubject
        | AssessError::EmptyInput
        | AssessError::RecordingTooShort
        | AssessError::AudioUnprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssessError::Analysis(_) | AssessError::Feedback(_) => StatusCode::BAD_GATEWAY,
        AssessError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let retryable = err.is_retryable();
    tracing::warn!(error = %err, retryable, "assessment request failed");
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
            retryable,
        }),
    )
}

fn decode_input(body: &AssessBody) -> Result<RawInput, ApiError> {
    let kind = body.input_kind.unwrap_or(if body.audio_base64.is_some() {
        InputKind::Audio
    } else {
        InputKind::Text
    });

    match kind {
        InputKind::Text => {
            let text = body.text.clone().unwrap_or_default();
            Ok(RawInput::Text(text))
        }
        InputKind::Audio => {
            let Some(encoded) = body.audio_base64.as_deref() else {
                return Err(reject(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "audio submission is missing the audio payload",
                ));
            };
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|_| {
                    reject(
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        "audio payload is not valid base64",
                    )
                })?;
            Ok(RawInput::Audio {
                bytes,
                mime_type: body
                    .audio_mime
                    .clone()
                    .unwrap_or_else(|| "audio/webm".to_string()),
            })
        }
    }
}

async fn create_assessment(
    State(state): State<AppState>,
    Json(body): Json<AssessBody>,
) -> Result<Json<AssessmentResult>, ApiError> {
    let input = decode_input(&body)?;
    let request = AssessmentRequest {
        subject: body.subject.clone(),
        input,
    };

    let result = state
        .pipeline
        .assess(request)
        .await
        .map_err(assess_error_response)?;

    state
        .store
        .insert(&result)
        .await
        .map_err(|e| assess_error_response(AssessError::Store(e)))?;

    state
        .remember_language(body.session.as_deref(), &result.language)
        .await;

    Ok(Json(result))
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssessmentResult>, ApiError> {
    let result = state
        .store
        .fetch(id)
        .await
        .map_err(|e| assess_error_response(AssessError::Store(e)))?;
    result
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("assessment {id} not found")))
}
