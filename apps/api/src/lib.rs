//! Tailor: job-tailored resume and cover-letter generation.
//!
//! Library core: `templates` (storage and resolution), `generation` (prompt
//! composition, assembly, workflow, sessions) and `llm_client` (completion
//! backends). `routes` wires the handlers into an Axum router.

pub mod config;
pub mod errors;
pub mod generation;
pub mod llm_client;
pub mod routes;
pub mod state;
pub mod templates;
