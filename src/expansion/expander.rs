//! Interface to the external expander.
//!
//! The expander is a collaborator: this crate never inspects how directives
//! are parsed or what the generated code contains. It only consumes the
//! [`ExpansionOutput`] contract below.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::provider::ProviderResolver;
use crate::mapping::SegmentMapping;

/// Options forwarded verbatim to the expander.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpandOptions {
    /// Keep the original annotation syntax in the expanded output.
    #[serde(default)]
    pub keep_annotations: bool,

    /// Expander-specific switches this crate does not interpret.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Everything the expander receives for one invocation.
pub struct ExpandRequest<'a> {
    pub source: &'a str,
    pub file: &'a Url,
    pub options: &'a ExpandOptions,
    pub providers: &'a ProviderResolver,
}

/// Severity as reported by the expander. Unknown values map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpanderSeverity {
    Error,
    Warning,
    Info,
    #[serde(other)]
    Other,
}

/// Diagnostic emitted by the expander itself.
///
/// `start` and `end` are byte offsets in the ORIGINAL source. They are
/// reported to the host as-is and never passed through a position mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpanderDiagnostic {
    pub severity: ExpanderSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

impl ExpanderDiagnostic {
    pub fn new(severity: ExpanderSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            start: None,
            end: None,
        }
    }

    pub fn at(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }
}

/// Result of one expander invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionOutput {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declarations: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<ExpanderDiagnostic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_mapping: Option<SegmentMapping>,
}

/// Failure reported by the expander or one of its providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExpanderError {
    message: String,
}

impl ExpanderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ExpanderError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ExpanderError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// The external source-to-source rewriter.
pub trait Expander: Send + Sync {
    fn expand(&self, request: &ExpandRequest<'_>) -> Result<ExpansionOutput, ExpanderError>;
}

impl<F> Expander for F
where
    F: Fn(&ExpandRequest<'_>) -> Result<ExpansionOutput, ExpanderError> + Send + Sync,
{
    fn expand(&self, request: &ExpandRequest<'_>) -> Result<ExpansionOutput, ExpanderError> {
        self(request)
    }
}
