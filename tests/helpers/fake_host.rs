//! In-memory source host and a scripted analysis service.

use std::sync::Mutex;

use dashmap::DashMap;
use url::Url;
use utsushi::expansion::ContentVersion;
use utsushi::host::{
    AnalysisService, CompletionList, Diagnostic, DocumentHighlight, InlayHint, Location,
    OutlineItem, QuickInfo, ReferenceEntry, RenameInfo, SourceHost,
};
use utsushi::mapping::TextSpan;

#[derive(Default)]
pub struct MemorySources {
    files: DashMap<Url, (String, i32)>,
}

impl MemorySources {
    pub fn set(&self, file: &Url, content: &str, version: i32) {
        self.files
            .insert(file.clone(), (content.to_string(), version));
    }
}

impl SourceHost for MemorySources {
    fn file_names(&self) -> Vec<Url> {
        let mut names: Vec<Url> = self.files.iter().map(|f| f.key().clone()).collect();
        names.sort();
        names
    }

    fn file_exists(&self, file: &Url) -> bool {
        self.files.contains_key(file)
    }

    fn content(&self, file: &Url) -> Option<String> {
        self.files.get(file).map(|f| f.value().0.clone())
    }

    fn version(&self, file: &Url) -> Option<ContentVersion> {
        self.files.get(file).map(|f| ContentVersion::from(f.value().1))
    }
}

/// Analysis service returning canned results in whatever coordinates the
/// test scripts, and recording the positions it was asked about.
#[derive(Default)]
pub struct ScriptedService {
    pub diagnostics: Vec<Diagnostic>,
    pub quick_info: Option<QuickInfo>,
    pub completions: Option<CompletionList>,
    pub locations: Vec<Location>,
    pub references: Vec<ReferenceEntry>,
    pub rename: Option<RenameInfo>,
    pub highlights: Vec<DocumentHighlight>,
    pub outline: Vec<OutlineItem>,
    pub hints: Vec<InlayHint>,
    pub positions: Mutex<Vec<usize>>,
    pub spans: Mutex<Vec<TextSpan>>,
}

impl ScriptedService {
    fn record(&self, position: usize) {
        self.positions.lock().unwrap().push(position);
    }

    pub fn last_position(&self) -> Option<usize> {
        self.positions.lock().unwrap().last().copied()
    }

    pub fn last_span(&self) -> Option<TextSpan> {
        self.spans.lock().unwrap().last().copied()
    }
}

impl AnalysisService for ScriptedService {
    fn syntactic_diagnostics(&self, _file: &Url) -> Vec<Diagnostic> {
        self.diagnostics.clone()
    }

    fn semantic_diagnostics(&self, _file: &Url) -> Vec<Diagnostic> {
        self.diagnostics.clone()
    }

    fn quick_info(&self, _file: &Url, position: usize) -> Option<QuickInfo> {
        self.record(position);
        self.quick_info.clone()
    }

    fn completions(&self, _file: &Url, position: usize) -> Option<CompletionList> {
        self.record(position);
        self.completions.clone()
    }

    fn definition(&self, _file: &Url, position: usize) -> Vec<Location> {
        self.record(position);
        self.locations.clone()
    }

    fn references(&self, _file: &Url, position: usize) -> Vec<ReferenceEntry> {
        self.record(position);
        self.references.clone()
    }

    fn rename_info(&self, _file: &Url, position: usize) -> RenameInfo {
        self.record(position);
        self.rename.clone().unwrap_or(RenameInfo::Unavailable {
            reason: "nothing scripted".to_string(),
        })
    }

    fn rename_locations(&self, _file: &Url, position: usize) -> Vec<Location> {
        self.record(position);
        self.locations.clone()
    }

    fn document_highlights(&self, _file: &Url, position: usize) -> Vec<DocumentHighlight> {
        self.record(position);
        self.highlights.clone()
    }

    fn outline(&self, _file: &Url) -> Vec<OutlineItem> {
        self.outline.clone()
    }

    fn inlay_hints(&self, _file: &Url, span: TextSpan) -> Vec<InlayHint> {
        self.spans.lock().unwrap().push(span);
        self.hints.clone()
    }
}
