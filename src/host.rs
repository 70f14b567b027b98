//! Interfaces shared with the host analysis service.

mod expanding;
mod service;
mod types;

pub use expanding::ExpandingSourceHost;
pub use service::{AnalysisService, SourceHost};
pub use types::{
    CompletionEntry, CompletionList, Diagnostic, DocumentHighlight, HighlightKind, InlayHint,
    InlayHintKind, Location, OutlineItem, QuickInfo, ReferenceEntry, RenameInfo, Severity,
};
