use url::Url;

use super::types::{
    CompletionList, Diagnostic, DocumentHighlight, InlayHint, Location, OutlineItem, QuickInfo,
    ReferenceEntry, RenameInfo,
};
use crate::expansion::ContentVersion;
use crate::mapping::TextSpan;

/// Where the host reads project files from.
pub trait SourceHost: Send + Sync {
    fn file_names(&self) -> Vec<Url>;

    fn file_exists(&self, file: &Url) -> bool;

    fn content(&self, file: &Url) -> Option<String>;

    /// Current version token. `None` when the host does not track the file.
    fn version(&self, file: &Url) -> Option<ContentVersion>;
}

/// Query interface of the host analysis service.
///
/// Positions are byte offsets into the content the service was given for
/// `file`.
pub trait AnalysisService: Send + Sync {
    fn syntactic_diagnostics(&self, file: &Url) -> Vec<Diagnostic>;

    fn semantic_diagnostics(&self, file: &Url) -> Vec<Diagnostic>;

    fn quick_info(&self, file: &Url, position: usize) -> Option<QuickInfo>;

    fn completions(&self, file: &Url, position: usize) -> Option<CompletionList>;

    fn definition(&self, file: &Url, position: usize) -> Vec<Location>;

    fn references(&self, file: &Url, position: usize) -> Vec<ReferenceEntry>;

    fn rename_info(&self, file: &Url, position: usize) -> RenameInfo;

    fn rename_locations(&self, file: &Url, position: usize) -> Vec<Location>;

    fn document_highlights(&self, file: &Url, position: usize) -> Vec<DocumentHighlight>;

    fn outline(&self, file: &Url) -> Vec<OutlineItem>;

    fn inlay_hints(&self, file: &Url, span: TextSpan) -> Vec<InlayHint>;
}
