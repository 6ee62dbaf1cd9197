//! Document Assembler — drops generated text into a template at a literal marker.

use tracing::warn;

/// Marker the built-in cover-letter template carries.
pub const DEFAULT_MARKER: &str = "[COVER_LETTER_BODY]";

/// Result of one insertion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub document: String,
    /// `false` when the marker was absent and the content was dropped.
    pub inserted: bool,
}

/// Replaces the first occurrence of `marker` with `content`.
///
/// An absent (or empty) marker is not an error: the template comes back
/// unchanged and the miss is logged.
pub fn assemble(template: &str, content: &str, marker: &str) -> Assembly {
    if marker.is_empty() || !template.contains(marker) {
        warn!(
            marker,
            content_len = content.len(),
            "Marker not found in template; generated content was not inserted"
        );
        return Assembly {
            document: template.to_string(),
            inserted: false,
        };
    }

    Assembly {
        document: template.replacen(marker, content, 1),
        inserted: true,
    }
}

/// Convenience form of [`assemble`] returning only the document.
pub fn insert(template: &str, content: &str, marker: &str) -> String {
    assemble(template, content, marker).document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_replaced() {
        let out = insert(
            "\\begin{letter}\n[COVER_LETTER_BODY]\n\\end{letter}",
            "I am writing to apply.",
            DEFAULT_MARKER,
        );
        assert_eq!(out, "\\begin{letter}\nI am writing to apply.\n\\end{letter}");
    }

    #[test]
    fn test_missing_marker_leaves_template_unchanged() {
        assert_eq!(insert("X", "Y", "[MISSING]"), "X");
        assert!(!assemble("X", "Y", "[MISSING]").inserted);
    }

    #[test]
    fn test_only_first_occurrence_is_replaced() {
        let out = insert("[M] and [M]", "body", "[M]");
        assert_eq!(out, "body and [M]");
    }

    #[test]
    fn test_reinsertion_after_substitution_is_noop() {
        let once = insert("Dear team,\n[COVER_LETTER_BODY]\nRegards", "Body", DEFAULT_MARKER);
        let twice = assemble(&once, "Body again", DEFAULT_MARKER);
        assert_eq!(twice.document, once);
        assert!(!twice.inserted);
    }

    #[test]
    fn test_empty_marker_counts_as_absent() {
        let assembly = assemble("template", "content", "");
        assert_eq!(assembly.document, "template");
        assert!(!assembly.inserted);
    }

    #[test]
    fn test_content_is_inserted_verbatim() {
        let out = insert("<<[B]>>", "50% & $5 {x}", "[B]");
        assert_eq!(out, "<<50% & $5 {x}>>");
    }
}
