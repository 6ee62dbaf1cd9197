// Built-in templates used when nothing has been saved under a kind's name.

/// Minimal one-page resume skeleton.
pub const DEFAULT_RESUME_TEMPLATE: &str = r#"\documentclass[11pt]{article}
\usepackage[margin=0.75in]{geometry}
\usepackage{enumitem}
\setlist[itemize]{leftmargin=*, noitemsep}
\pagestyle{empty}

\begin{document}

\begin{center}
  {\LARGE Your Name} \\
  you@example.com \quad (555) 555-0100 \quad github.com/you
\end{center}

\section*{Summary}
One or two sentences on who you are and what you build.

\section*{Experience}
\textbf{Job Title}, Company \hfill 2021 -- Present
\begin{itemize}
  \item What you shipped and the measurable result.
\end{itemize}

\section*{Skills}
Languages, frameworks, tools.

\section*{Education}
Degree, Institution \hfill Year

\end{document}
"#;

/// Cover-letter skeleton. Contains the default marker exactly once.
pub const DEFAULT_COVER_LETTER_TEMPLATE: &str = r#"\documentclass[11pt]{letter}
\usepackage[margin=1in]{geometry}
\signature{Your Name}
\address{you@example.com \\ (555) 555-0100}

\begin{document}
\begin{letter}{Hiring Manager}
\opening{Dear Hiring Manager,}

[COVER_LETTER_BODY]

\closing{Sincerely,}
\end{letter}
\end{document}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::assembler::DEFAULT_MARKER;

    #[test]
    fn test_cover_letter_default_has_marker_once() {
        assert_eq!(DEFAULT_COVER_LETTER_TEMPLATE.matches(DEFAULT_MARKER).count(), 1);
    }

    #[test]
    fn test_resume_default_is_a_complete_document() {
        assert!(DEFAULT_RESUME_TEMPLATE.starts_with("\\documentclass"));
        assert!(DEFAULT_RESUME_TEMPLATE.trim_end().ends_with("\\end{document}"));
    }
}
