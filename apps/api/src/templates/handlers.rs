//! Axum route handlers for templates.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::templates::{resolve_kind, TemplateKind, TemplateResolution};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub name: &'static str,
    /// "saved" or "default"
    pub source: &'static str,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub kind: TemplateKind,
    /// `true` when saved to the store, `false` when kept for the session's next run only.
    pub persisted: bool,
    pub bytes: usize,
}

pub(crate) fn parse_kind(raw: &str) -> Result<TemplateKind, AppError> {
    raw.parse::<TemplateKind>().map_err(AppError::Validation)
}

fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::Validation(format!(
            "persist must be true or false, got '{other}'"
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/templates/:kind
///
/// Returns the body a new run would use, and whether it is the saved one or the built-in default.
/// The built-in cover letter carries the configured marker.
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<TemplateResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let resolution =
        resolve_kind(state.store.as_ref(), kind, state.workflow.marker()).await?;
    let source = resolution.source();
    let body = match resolution {
        TemplateResolution::Found(body) | TemplateResolution::UsedDefault(body) => body,
        TemplateResolution::Missing => {
            return Err(AppError::NotFound(format!("Template '{kind}' not found")))
        }
    };

    Ok(Json(TemplateResponse {
        name: kind.store_name(),
        source,
        body,
    }))
}

/// POST /api/v1/sessions/:id/templates/:kind
///
/// Multipart upload. Field `file` carries the template (content is not validated);
/// field `persist=true` saves it to the store, otherwise it is used for the next run only.
pub async fn handle_upload_template(
    State(state): State<AppState>,
    Path((session_id, kind)): Path<(Uuid, String)>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    if state.sessions.snapshot(session_id).await.is_none() {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }

    let mut file: Option<(Option<String>, Bytes)> = None;
    let mut persist = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((file_name, data));
            }
            Some("persist") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field: {e}")))?;
                persist = parse_flag(&raw)?;
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if let Some(name) = file_name.as_deref() {
        if !name.ends_with(".tex") {
            warn!("Template upload '{name}' does not have a .tex extension; accepting as text");
        }
    }
    let body = String::from_utf8(data.to_vec())
        .map_err(|_| AppError::Validation("Template must be UTF-8 text".to_string()))?;
    let bytes = body.len();

    if persist {
        state.store.save(kind.store_name(), &body).await?;
        // A saved template supersedes any one-shot upload still pending.
        state
            .sessions
            .update(session_id, |session| session.clear_override(kind))
            .await;
    } else {
        state
            .sessions
            .update(session_id, |session| session.set_override(kind, body))
            .await
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
    }

    info!("Uploaded {kind} template for session {session_id} ({bytes} bytes, persisted={persist})");
    Ok(Json(UploadResponse {
        kind,
        persisted: persist,
        bytes,
    }))
}
