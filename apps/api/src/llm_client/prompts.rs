// Shared prompt fragments used by more than one generation stage.
// Stage-specific prompts live in generation::prompts.

/// System prompt for stages whose output is dropped straight into a LaTeX document.
pub const LATEX_ONLY_SYSTEM: &str = "You are an expert resume writer and LaTeX typesetter. \
    Respond with LaTeX source only. \
    Do NOT wrap the output in markdown code fences. \
    Do NOT include explanations, apologies or commentary.";

/// Common instruction appended to every generation prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the candidate's resume. \
    Do NOT invent employers, titles, dates, degrees or metrics. \
    Reword and reorder existing material to match the job; never fabricate it.";
