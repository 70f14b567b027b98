//! Result shapes exchanged with the host analysis service.
//!
//! All spans are UTF-8 byte offsets into the file named alongside them.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::mapping::TextSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// File the diagnostic points into. `None` means the queried file.
    pub file: Option<Url>,
    /// `None` for file-level diagnostics.
    pub span: Option<TextSpan>,
    pub message: String,
    pub severity: Severity,
    pub code: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            file: None,
            span: None,
            message: message.into(),
            severity,
            code: None,
            source: None,
        }
    }

    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.span = Some(span);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickInfo {
    pub span: TextSpan,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub name: String,
    pub kind: Option<String>,
    pub detail: Option<String>,
    /// Text the entry replaces when accepted.
    pub replacement_span: Option<TextSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionList {
    pub entries: Vec<CompletionEntry>,
    pub is_incomplete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: Url,
    pub span: TextSpan,
}

impl Location {
    pub fn new(file: Url, span: TextSpan) -> Self {
        Self { file, span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub location: Location,
    pub is_write: bool,
    pub is_definition: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenameInfo {
    Available {
        display_name: String,
        trigger_span: TextSpan,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Text,
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHighlight {
    pub span: TextSpan,
    pub kind: HighlightKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub name: String,
    pub kind: String,
    pub span: TextSpan,
    pub selection_span: TextSpan,
    #[serde(default)]
    pub children: Vec<OutlineItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlayHintKind {
    Type,
    Parameter,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlayHint {
    pub position: usize,
    pub label: String,
    pub kind: InlayHintKind,
}
