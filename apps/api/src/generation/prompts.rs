// Default prompt templates for the two generation stages.
// Slot syntax is documented in generation::composer.

/// Resume-modification stage.
/// Slots: {job_description}, {resume}, {grounding_instruction}
pub const RESUME_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

You will receive a job description and the candidate's current resume as a LaTeX document.
Rewrite the resume so it is tailored to the job:

1. Reorder and rephrase bullet points so the most relevant experience comes first
2. Mirror the job description's terminology where the resume already supports it
3. Tighten the skills section to the technologies the role asks for
4. Keep the document class, preamble, macros and overall structure unchanged
5. Return the COMPLETE modified LaTeX document, from \documentclass to \end{{document}}

JOB DESCRIPTION:
{job_description}

CURRENT RESUME (LaTeX):
{resume}"#;

/// Cover-letter stage. `{resume}` is the already-tailored resume.
/// Slots: {job_description}, {resume}, {cover_letter_template}, {marker}, {grounding_instruction}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

Write the body of a cover letter for the job below, based on the candidate's tailored resume.

RULES:
1. Write three to four paragraphs, no more than 350 words in total
2. Open with the specific role and why the candidate fits it; close with a call to action
3. Output ONLY the body paragraphs: no salutation, no sign-off, no preamble
4. Separate paragraphs with a blank line; escape LaTeX special characters (& % $ # _)
5. Your text will replace {marker} in the template shown below, so match its tone

JOB DESCRIPTION:
{job_description}

TAILORED RESUME (LaTeX):
{resume}

COVER LETTER TEMPLATE (LaTeX):
{cover_letter_template}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::composer::PromptSpec;

    #[test]
    fn test_resume_prompt_slots() {
        let spec = PromptSpec::new(RESUME_PROMPT_TEMPLATE);
        assert_eq!(
            spec.slots(),
            vec!["grounding_instruction", "job_description", "resume"]
        );
    }

    #[test]
    fn test_cover_letter_prompt_slots() {
        let spec = PromptSpec::new(COVER_LETTER_PROMPT_TEMPLATE);
        assert_eq!(
            spec.slots(),
            vec![
                "grounding_instruction",
                "marker",
                "job_description",
                "resume",
                "cover_letter_template"
            ]
        );
    }
}
