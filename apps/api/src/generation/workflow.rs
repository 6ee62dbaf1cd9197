//! Generation Workflow — tailors a resume to a job, then writes a cover letter from it.
//!
//! Flow: compose resume prompt → complete → compose cover-letter prompt (with the
//!       *modified* resume) → complete → insert body at the marker → done.
//!
//! The two completions never overlap and nothing is retried. Any failure ends the
//! run in `Failed(kind)` while keeping whatever was already produced.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::generation::assembler::{assemble, DEFAULT_MARKER};
use crate::generation::composer::{compose, Bindings, PromptError, PromptSpec};
use crate::generation::prompts::{COVER_LETTER_PROMPT_TEMPLATE, RESUME_PROMPT_TEMPLATE};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, LATEX_ONLY_SYSTEM};
use crate::llm_client::{strip_code_fences, CompletionClient, CompletionError, CompletionOptions};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Why a run ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CredentialMissing,
    Backend,
    Timeout,
    EmptyResponse,
    MissingBinding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    ComposingResumePrompt,
    AwaitingResumeCompletion,
    ComposingCoverLetterPrompt,
    AwaitingCoverLetterCompletion,
    Assembling,
    Done,
    Failed(FailureKind),
}

/// Failure of a run. Wraps the original error without changing its kind.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl WorkflowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkflowError::Completion(CompletionError::CredentialMissing { .. }) => {
                FailureKind::CredentialMissing
            }
            WorkflowError::Completion(CompletionError::Backend { .. }) => FailureKind::Backend,
            WorkflowError::Completion(CompletionError::Timeout { .. }) => FailureKind::Timeout,
            WorkflowError::Completion(CompletionError::EmptyResponse { .. }) => {
                FailureKind::EmptyResponse
            }
            WorkflowError::Prompt(PromptError::MissingBinding { .. }) => {
                FailureKind::MissingBinding
            }
        }
    }
}

/// Everything one run needs. Prompt overrides replace the stage defaults for this run only.
#[derive(Debug, Clone, Default)]
pub struct WorkflowInput {
    pub job_description: String,
    pub resume_template: String,
    pub cover_letter_template: String,
    pub resume_prompt: Option<PromptSpec>,
    pub cover_letter_prompt: Option<PromptSpec>,
}

/// Output of a successful run, kept in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: Uuid,
    pub job_description: String,
    pub modified_resume: String,
    pub cover_letter: String,
    pub created_at: DateTime<Utc>,
}

/// State and partial results of one run.
#[derive(Debug)]
pub struct WorkflowRun {
    pub state: WorkflowState,
    /// Every state entered, starting with `Idle`.
    pub transitions: Vec<WorkflowState>,
    pub job_description: String,
    pub modified_resume: Option<String>,
    pub cover_letter: Option<String>,
    /// `false` if the cover-letter template had no marker and the body was dropped.
    pub marker_inserted: bool,
    pub error: Option<WorkflowError>,
}

impl WorkflowRun {
    fn start(job_description: &str) -> Self {
        Self {
            state: WorkflowState::Idle,
            transitions: vec![WorkflowState::Idle],
            job_description: job_description.to_string(),
            modified_resume: None,
            cover_letter: None,
            marker_inserted: false,
            error: None,
        }
    }

    fn enter(&mut self, next: WorkflowState) {
        debug!(from = ?self.state, to = ?next, "Workflow transition");
        self.state = next.clone();
        self.transitions.push(next);
    }

    fn fail(mut self, error: impl Into<WorkflowError>) -> Self {
        let error = error.into();
        warn!(from = ?self.state, "Workflow failed: {error}");
        self.enter(WorkflowState::Failed(error.kind()));
        self.error = Some(error);
        self
    }

    pub fn is_done(&self) -> bool {
        self.state == WorkflowState::Done
    }

    /// Successful runs become a `GenerationResult`; failed runs yield their error.
    pub fn into_result(self) -> Result<GenerationResult, WorkflowError> {
        match (self.state, self.modified_resume, self.cover_letter, self.error) {
            (WorkflowState::Done, Some(modified_resume), Some(cover_letter), _) => {
                Ok(GenerationResult {
                    id: Uuid::new_v4(),
                    job_description: self.job_description,
                    modified_resume,
                    cover_letter,
                    created_at: Utc::now(),
                })
            }
            (_, _, _, Some(error)) => Err(error),
            (state, ..) => unreachable!("workflow run left in non-terminal state {state:?}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Workflow
// ────────────────────────────────────────────────────────────────────────────

/// Reusable, stateless orchestrator. One instance serves any number of concurrent runs.
pub struct GenerationWorkflow {
    client: Arc<dyn CompletionClient>,
    options: CompletionOptions,
    resume_prompt: PromptSpec,
    cover_letter_prompt: PromptSpec,
    marker: String,
}

impl GenerationWorkflow {
    pub fn new(client: Arc<dyn CompletionClient>, mut options: CompletionOptions) -> Self {
        if options.system.is_none() {
            options.system = Some(LATEX_ONLY_SYSTEM.to_string());
        }
        Self {
            client,
            options,
            resume_prompt: PromptSpec::new(RESUME_PROMPT_TEMPLATE),
            cover_letter_prompt: PromptSpec::new(COVER_LETTER_PROMPT_TEMPLATE),
            marker: DEFAULT_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_resume_prompt(mut self, spec: PromptSpec) -> Self {
        self.resume_prompt = spec;
        self
    }

    pub fn with_cover_letter_prompt(mut self, spec: PromptSpec) -> Self {
        self.cover_letter_prompt = spec;
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Runs both stages in order. Never panics on backend or prompt failures;
    /// inspect `WorkflowRun::state`.
    pub async fn run(&self, input: &WorkflowInput) -> WorkflowRun {
        let mut run = WorkflowRun::start(&input.job_description);
        info!(
            backend = %self.client.backend(),
            jd_len = input.job_description.len(),
            "Starting generation run"
        );

        // Stage 1: resume
        run.enter(WorkflowState::ComposingResumePrompt);
        let bindings: Bindings = [
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("job_description", input.job_description.as_str()),
            ("resume", input.resume_template.as_str()),
        ]
        .into_iter()
        .collect();
        let spec = input.resume_prompt.as_ref().unwrap_or(&self.resume_prompt);
        let prompt = match compose(spec, &bindings) {
            Ok(prompt) => prompt,
            Err(e) => return run.fail(e),
        };

        run.enter(WorkflowState::AwaitingResumeCompletion);
        let modified_resume = match self.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => return run.fail(e),
        };
        run.modified_resume = Some(modified_resume.clone());

        // Stage 2: cover letter, built on the tailored resume
        run.enter(WorkflowState::ComposingCoverLetterPrompt);
        let bindings: Bindings = [
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("job_description", input.job_description.as_str()),
            ("resume", modified_resume.as_str()),
            ("cover_letter_template", input.cover_letter_template.as_str()),
            ("marker", self.marker.as_str()),
        ]
        .into_iter()
        .collect();
        let spec = input
            .cover_letter_prompt
            .as_ref()
            .unwrap_or(&self.cover_letter_prompt);
        let prompt = match compose(spec, &bindings) {
            Ok(prompt) => prompt,
            Err(e) => return run.fail(e),
        };

        run.enter(WorkflowState::AwaitingCoverLetterCompletion);
        let body = match self.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => return run.fail(e),
        };

        run.enter(WorkflowState::Assembling);
        let assembly = assemble(&input.cover_letter_template, &body, &self.marker);
        run.marker_inserted = assembly.inserted;
        run.cover_letter = Some(assembly.document);

        run.enter(WorkflowState::Done);
        info!("Generation run complete");
        run
    }

    /// One completion call with fence clean-up. Empty-after-cleaning counts as empty.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let raw = self.client.complete(prompt, &self.options).await?;
        let cleaned = strip_code_fences(&raw);
        if cleaned.trim().is_empty() {
            return Err(CompletionError::EmptyResponse {
                backend: self.client.backend(),
            });
        }
        Ok(cleaned.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
