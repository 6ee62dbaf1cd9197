//! Axum route handlers for sessions and generation.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, ErrorBody};
use crate::generation::composer::PromptSpec;
use crate::generation::session::WorkflowSession;
use crate::generation::workflow::{FailureKind, GenerationResult, WorkflowInput};
use crate::state::AppState;
use crate::templates::store::TemplateStore;
use crate::templates::{resolve_kind, TemplateKind};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub job_description: String,
    /// Replaces the default resume-stage prompt for this run.
    pub resume_prompt: Option<String>,
    /// Replaces the default cover-letter-stage prompt for this run.
    pub cover_letter_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// "done" or "failed"
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    /// Position of `result` in the session history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_inserted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Tailored resume from a run whose cover-letter stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_resume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Which document of a stored result to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Document {
    ModifiedResume,
    CoverLetter,
}

impl Document {
    fn file_name(self) -> &'static str {
        match self {
            Document::ModifiedResume => "modified_resume.tex",
            Document::CoverLetter => "cover_letter.tex",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create().await;
    let created_at = state
        .sessions
        .snapshot(session_id)
        .await
        .map(|s| s.created_at())
        .unwrap_or_else(Utc::now);
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            created_at,
        }),
    )
}

/// POST /api/v1/sessions/:id/generate
///
/// Runs the full workflow: tailor resume → write cover letter → insert at marker.
/// On failure the status reflects the error kind and any tailored resume is still returned.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    let session = session_snapshot(&state, session_id).await?;
    let store = state.store.as_ref();
    let marker = state.workflow.marker();
    let input = WorkflowInput {
        job_description: request.job_description,
        resume_template: template_for(store, &session, TemplateKind::Resume, marker).await?,
        cover_letter_template: template_for(store, &session, TemplateKind::CoverLetter, marker)
            .await?,
        resume_prompt: request.resume_prompt.map(PromptSpec::new),
        cover_letter_prompt: request.cover_letter_prompt.map(PromptSpec::new),
    };

    // No session lock is held while the backend is working.
    let run = state.workflow.run(&input).await;

    if run.is_done() {
        let marker_inserted = run.marker_inserted;
        let result = run.into_result()?;
        let history_index = state
            .sessions
            .update(session_id, |s| s.record(result.clone(), &session))
            .await
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
        info!("Session {session_id}: stored result #{history_index}");

        return Ok((
            StatusCode::OK,
            Json(GenerateResponse {
                state: "done",
                result: Some(result),
                history_index: Some(history_index),
                marker_inserted: Some(marker_inserted),
                failure: None,
                modified_resume: None,
                error: None,
            }),
        ));
    }

    let modified_resume = run.modified_resume.clone();
    let failure = run.error.as_ref().map(|e| e.kind());
    let err = match run.into_result() {
        Err(err) => AppError::from(err),
        Ok(_) => AppError::Internal(anyhow::anyhow!("workflow reported failure without error")),
    };
    let (status, body) = err.status_and_body();

    Ok((
        status,
        Json(GenerateResponse {
            state: "failed",
            result: None,
            history_index: None,
            marker_inserted: None,
            failure,
            modified_resume,
            error: Some(body),
        }),
    ))
}

/// GET /api/v1/sessions/:id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<GenerationResult>>, AppError> {
    let session = session_snapshot(&state, session_id).await?;
    Ok(Json(session.history().to_vec()))
}

/// GET /api/v1/sessions/:id/history/:index/:document
///
/// Serves the literal document text as a `.tex` attachment.
pub async fn handle_download(
    State(state): State<AppState>,
    Path((session_id, index, document)): Path<(Uuid, usize, Document)>,
) -> Result<Response, AppError> {
    let session = session_snapshot(&state, session_id).await?;
    let result = session
        .get(index)
        .ok_or_else(|| AppError::NotFound(format!("Result #{index} not found")))?;

    let body = match document {
        Document::ModifiedResume => result.modified_resume.clone(),
        Document::CoverLetter => result.cover_letter.clone(),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/x-tex".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.file_name()),
            ),
        ],
        body,
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn session_snapshot(state: &AppState, id: Uuid) -> Result<WorkflowSession, AppError> {
    state
        .sessions
        .snapshot(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// Session override if one is pending, otherwise the saved template or built-in default.
async fn template_for(
    store: &dyn TemplateStore,
    session: &WorkflowSession,
    kind: TemplateKind,
    marker: &str,
) -> Result<String, AppError> {
    if let Some(body) = session.pending_override(kind) {
        return Ok(body.to_string());
    }
    resolve_kind(store, kind, marker)
        .await?
        .into_body()
        .ok_or_else(|| AppError::NotFound(format!("No {kind} template available")))
}
