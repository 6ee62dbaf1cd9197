use std::sync::Arc;

use crate::generation::session::SessionRegistry;
use crate::generation::workflow::GenerationWorkflow;
use crate::templates::store::TemplateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Saved templates. Never written while a workflow run is in flight.
    pub store: Arc<dyn TemplateStore>,
    /// Holds the completion client chosen at startup.
    pub workflow: Arc<GenerationWorkflow>,
    pub sessions: SessionRegistry,
}
