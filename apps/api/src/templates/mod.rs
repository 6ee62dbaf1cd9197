//! Resume and cover-letter templates: storage, built-in defaults, and the one
//! place that decides which body a run uses.

pub mod defaults;
pub mod handlers;
pub mod store;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generation::assembler::DEFAULT_MARKER;
use crate::templates::defaults::{DEFAULT_COVER_LETTER_TEMPLATE, DEFAULT_RESUME_TEMPLATE};
use crate::templates::store::{StoreError, TemplateStore};

/// The two documents a workflow run consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Resume,
    CoverLetter,
}

impl TemplateKind {
    /// Name the kind is stored under.
    pub fn store_name(self) -> &'static str {
        match self {
            TemplateKind::Resume => "resume",
            TemplateKind::CoverLetter => "cover_letter",
        }
    }

    pub fn default_body(self) -> &'static str {
        match self {
            TemplateKind::Resume => DEFAULT_RESUME_TEMPLATE,
            TemplateKind::CoverLetter => DEFAULT_COVER_LETTER_TEMPLATE,
        }
    }

    /// Built-in body with the cover-letter marker swapped for `marker`.
    pub fn default_body_with_marker(self, marker: &str) -> Cow<'static, str> {
        let body = self.default_body();
        if marker.is_empty() || marker == DEFAULT_MARKER || !body.contains(DEFAULT_MARKER) {
            Cow::Borrowed(body)
        } else {
            Cow::Owned(body.replacen(DEFAULT_MARKER, marker, 1))
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.store_name())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume" => Ok(TemplateKind::Resume),
            "cover_letter" | "cover-letter" => Ok(TemplateKind::CoverLetter),
            other => Err(format!(
                "unknown template kind '{other}' (expected 'resume' or 'cover_letter')"
            )),
        }
    }
}

/// Where a template body came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateResolution {
    Found(String),
    UsedDefault(String),
    Missing,
}

impl TemplateResolution {
    pub fn body(&self) -> Option<&str> {
        match self {
            TemplateResolution::Found(body) | TemplateResolution::UsedDefault(body) => Some(body),
            TemplateResolution::Missing => None,
        }
    }

    pub fn into_body(self) -> Option<String> {
        match self {
            TemplateResolution::Found(body) | TemplateResolution::UsedDefault(body) => Some(body),
            TemplateResolution::Missing => None,
        }
    }

    /// `"saved"`, `"default"` or `"missing"`.
    pub fn source(&self) -> &'static str {
        match self {
            TemplateResolution::Found(_) => "saved",
            TemplateResolution::UsedDefault(_) => "default",
            TemplateResolution::Missing => "missing",
        }
    }
}

/// Saved body, else `default`, else `Missing`. Storage failures propagate.
pub async fn resolve(
    store: &dyn TemplateStore,
    name: &str,
    default: Option<&str>,
) -> Result<TemplateResolution, StoreError> {
    let resolution = match store.load(name).await? {
        Some(template) => TemplateResolution::Found(template.body),
        None => match default {
            Some(body) => TemplateResolution::UsedDefault(body.to_string()),
            None => TemplateResolution::Missing,
        },
    };
    debug!("Resolved template '{name}' from {}", resolution.source());
    Ok(resolution)
}

/// [`resolve`] using the kind's store name and built-in default. The default
/// cover letter carries `marker` so the assembler can find it.
pub async fn resolve_kind(
    store: &dyn TemplateStore,
    kind: TemplateKind,
    marker: &str,
) -> Result<TemplateResolution, StoreError> {
    let default = kind.default_body_with_marker(marker);
    resolve(store, kind.store_name(), Some(&*default)).await
}
