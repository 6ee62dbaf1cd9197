//! Caller-owned session state: one-shot template overrides and generation history.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::generation::workflow::GenerationResult;
use crate::templates::TemplateKind;

/// One user's working context. Nothing here is shared between sessions.
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    resume_override: Option<String>,
    cover_letter_override: Option<String>,
    history: Vec<GenerationResult>,
}

impl Default for WorkflowSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            resume_override: None,
            cover_letter_override: None,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Uses `body` instead of the stored template until the next successful run.
    pub fn set_override(&mut self, kind: TemplateKind, body: String) {
        match kind {
            TemplateKind::Resume => self.resume_override = Some(body),
            TemplateKind::CoverLetter => self.cover_letter_override = Some(body),
        }
    }

    pub fn pending_override(&self, kind: TemplateKind) -> Option<&str> {
        match kind {
            TemplateKind::Resume => self.resume_override.as_deref(),
            TemplateKind::CoverLetter => self.cover_letter_override.as_deref(),
        }
    }

    pub fn clear_override(&mut self, kind: TemplateKind) {
        match kind {
            TemplateKind::Resume => self.resume_override = None,
            TemplateKind::CoverLetter => self.cover_letter_override = None,
        }
    }

    /// Appends a successful run and consumes the overrides it ran with.
    /// `used` is the snapshot the run was built from; overrides set after it was
    /// taken stay pending. Returns the result's position in the history.
    pub fn record(&mut self, result: GenerationResult, used: &WorkflowSession) -> usize {
        for kind in [TemplateKind::Resume, TemplateKind::CoverLetter] {
            let consumed = used.pending_override(kind);
            if consumed.is_some() && self.pending_override(kind) == consumed {
                self.clear_override(kind);
            }
        }
        self.history.push(result);
        self.history.len() - 1
    }

    /// Results in the order they were produced.
    pub fn history(&self) -> &[GenerationResult] {
        &self.history
    }

    pub fn get(&self, index: usize) -> Option<&GenerationResult> {
        self.history.get(index)
    }

    pub fn latest(&self) -> Option<&GenerationResult> {
        self.history.last()
    }
}

/// Session lookup for the HTTP layer. Locks are never held across a workflow run:
/// handlers take a snapshot, run, then write back.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, WorkflowSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let session = WorkflowSession::new();
        let id = session.id();
        self.sessions.write().await.insert(id, session);
        info!("Created session {id}");
        id
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<WorkflowSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Applies `f` to the session, or returns `None` if it does not exist.
    pub async fn update<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut WorkflowSession) -> R,
    {
        self.sessions.write().await.get_mut(&id).map(f)
    }
}
