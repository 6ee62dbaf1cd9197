// Resume and cover-letter generation.
// Implements: prompt composition, marker assembly, the two-stage workflow, sessions.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod assembler;
pub mod composer;
pub mod handlers;
pub mod prompts;
pub mod session;
pub mod workflow;
