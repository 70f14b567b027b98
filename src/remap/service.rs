//! Analysis service decorator translating positions.
//!
//! Every query on an expandable file goes through the same steps:
//!
//! 1. make sure the file's expansion is current (`ExpansionSession::entry_for`);
//! 2. map the input position/span from original to expanded coordinates;
//! 3. delegate to the wrapped service;
//! 4. map every output position/span back to original coordinates.
//!
//! Outputs that point into generated text have no original counterpart.
//! They are dropped from collections and suppress single results.

use std::sync::Arc;

use url::Url;

use super::diagnostics::from_expander;
use crate::expansion::ExpansionEntry;
use crate::host::{
    AnalysisService, CompletionList, Diagnostic, DocumentHighlight, InlayHint, Location,
    OutlineItem, QuickInfo, ReferenceEntry, RenameInfo,
};
use crate::mapping::{PositionMapper, TextSpan};
use crate::session::ExpansionSession;

const GENERATED_RENAME_REASON: &str = "Cannot rename code produced by expansion";

pub struct RemappingService<S> {
    inner: S,
    session: Arc<ExpansionSession>,
}

impl<S: AnalysisService> RemappingService<S> {
    pub fn new(inner: S, session: Arc<ExpansionSession>) -> Self {
        Self { inner, session }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn session(&self) -> &Arc<ExpansionSession> {
        &self.session
    }

    // ========================================================================
    // Span translation
    // ========================================================================

    fn span_to_original(mapper: &dyn PositionMapper, span: TextSpan) -> Option<TextSpan> {
        mapper.map_span_to_original(span.start, span.length)
    }

    /// Remap a location that may point into any file.
    ///
    /// `current` is the queried file with its entry, reused when the location
    /// points back into it.
    fn remap_location(
        &self,
        location: Location,
        current: Option<(&Url, &ExpansionEntry)>,
    ) -> Option<Location> {
        if let Some((file, entry)) = current
            && location.file == *file
        {
            let span = Self::span_to_original(entry.mapper.as_ref(), location.span)?;
            return Some(Location::new(location.file, span));
        }
        if self.session.registry().has(&location.file) {
            return Some(location);
        }
        match self.session.entry_for(&location.file) {
            Some(entry) => {
                let span = Self::span_to_original(entry.mapper.as_ref(), location.span)?;
                Some(Location::new(location.file, span))
            }
            None => Some(location),
        }
    }

    fn remap_locations(
        &self,
        file: &Url,
        entry: Option<&ExpansionEntry>,
        locations: Vec<Location>,
        kind: &str,
    ) -> Vec<Location> {
        let total = locations.len();
        let current = entry.map(|entry| (file, entry));
        let remapped: Vec<Location> = locations
            .into_iter()
            .filter_map(|location| self.remap_location(location, current))
            .collect();
        log_dropped(file, kind, total - remapped.len());
        remapped
    }

    fn remap_diagnostics(
        &self,
        file: &Url,
        entry: &ExpansionEntry,
        diagnostics: Vec<Diagnostic>,
    ) -> Vec<Diagnostic> {
        let total = diagnostics.len();
        let remapped: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter_map(|mut diagnostic| {
                let Some(span) = diagnostic.span else {
                    return Some(diagnostic);
                };
                let target = diagnostic.file.clone().unwrap_or_else(|| file.clone());
                let location = self.remap_location(
                    Location::new(target, span),
                    Some((file, entry)),
                )?;
                diagnostic.span = Some(location.span);
                Some(diagnostic)
            })
            .collect();
        log_dropped(file, "diagnostic", total - remapped.len());
        remapped
    }

    fn remap_outline(mapper: &dyn PositionMapper, items: Vec<OutlineItem>) -> Vec<OutlineItem> {
        items
            .into_iter()
            .filter_map(|item| {
                let span = Self::span_to_original(mapper, item.span)?;
                let selection_span = Self::span_to_original(mapper, item.selection_span)?;
                Some(OutlineItem {
                    span,
                    selection_span,
                    children: Self::remap_outline(mapper, item.children),
                    ..item
                })
            })
            .collect()
    }
}

impl<S: AnalysisService> AnalysisService for RemappingService<S> {
    fn syntactic_diagnostics(&self, file: &Url) -> Vec<Diagnostic> {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.syntactic_diagnostics(file);
        };
        let diagnostics = self.inner.syntactic_diagnostics(file);
        self.remap_diagnostics(file, &entry, diagnostics)
    }

    fn semantic_diagnostics(&self, file: &Url) -> Vec<Diagnostic> {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.semantic_diagnostics(file);
        };
        let diagnostics = self.inner.semantic_diagnostics(file);
        let mut merged = self.remap_diagnostics(file, &entry, diagnostics);

        let source = self.session.settings().diagnostic_source.clone();
        merged.extend(
            entry
                .diagnostics
                .iter()
                .map(|diagnostic| from_expander(diagnostic, &source)),
        );
        merged
    }

    fn quick_info(&self, file: &Url, position: usize) -> Option<QuickInfo> {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.quick_info(file, position);
        };
        let info = self
            .inner
            .quick_info(file, entry.mapper.original_to_expanded(position))?;
        let Some(span) = Self::span_to_original(entry.mapper.as_ref(), info.span) else {
            log_dropped(file, "quick info", 1);
            return None;
        };
        Some(QuickInfo { span, ..info })
    }

    fn completions(&self, file: &Url, position: usize) -> Option<CompletionList> {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.completions(file, position);
        };
        let list = self
            .inner
            .completions(file, entry.mapper.original_to_expanded(position))?;
        let total = list.entries.len();
        let entries: Vec<_> = list
            .entries
            .into_iter()
            .filter_map(|mut completion| {
                if let Some(span) = completion.replacement_span {
                    completion.replacement_span =
                        Some(Self::span_to_original(entry.mapper.as_ref(), span)?);
                }
                Some(completion)
            })
            .collect();
        log_dropped(file, "completion", total - entries.len());
        Some(CompletionList {
            entries,
            is_incomplete: list.is_incomplete,
        })
    }

    fn definition(&self, file: &Url, position: usize) -> Vec<Location> {
        let entry = self.session.entry_for(file);
        let position = entry
            .as_ref()
            .map_or(position, |entry| entry.mapper.original_to_expanded(position));
        let locations = self.inner.definition(file, position);
        self.remap_locations(file, entry.as_deref(), locations, "definition")
    }

    fn references(&self, file: &Url, position: usize) -> Vec<ReferenceEntry> {
        let entry = self.session.entry_for(file);
        let position = entry
            .as_ref()
            .map_or(position, |entry| entry.mapper.original_to_expanded(position));
        let references = self.inner.references(file, position);
        let total = references.len();
        let current = entry.as_deref().map(|entry| (file, entry));
        let remapped: Vec<ReferenceEntry> = references
            .into_iter()
            .filter_map(|reference| {
                let location = self.remap_location(reference.location, current)?;
                Some(ReferenceEntry {
                    location,
                    ..reference
                })
            })
            .collect();
        log_dropped(file, "reference", total - remapped.len());
        remapped
    }

    fn rename_info(&self, file: &Url, position: usize) -> RenameInfo {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.rename_info(file, position);
        };
        match self
            .inner
            .rename_info(file, entry.mapper.original_to_expanded(position))
        {
            RenameInfo::Available {
                display_name,
                trigger_span,
            } => match Self::span_to_original(entry.mapper.as_ref(), trigger_span) {
                Some(trigger_span) => RenameInfo::Available {
                    display_name,
                    trigger_span,
                },
                None => RenameInfo::Unavailable {
                    reason: GENERATED_RENAME_REASON.to_string(),
                },
            },
            unavailable => unavailable,
        }
    }

    fn rename_locations(&self, file: &Url, position: usize) -> Vec<Location> {
        let entry = self.session.entry_for(file);
        let position = entry
            .as_ref()
            .map_or(position, |entry| entry.mapper.original_to_expanded(position));
        let locations = self.inner.rename_locations(file, position);
        self.remap_locations(file, entry.as_deref(), locations, "rename location")
    }

    fn document_highlights(&self, file: &Url, position: usize) -> Vec<DocumentHighlight> {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.document_highlights(file, position);
        };
        let highlights = self
            .inner
            .document_highlights(file, entry.mapper.original_to_expanded(position));
        let total = highlights.len();
        let remapped: Vec<DocumentHighlight> = highlights
            .into_iter()
            .filter_map(|highlight| {
                let span = Self::span_to_original(entry.mapper.as_ref(), highlight.span)?;
                Some(DocumentHighlight { span, ..highlight })
            })
            .collect();
        log_dropped(file, "highlight", total - remapped.len());
        remapped
    }

    fn outline(&self, file: &Url) -> Vec<OutlineItem> {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.outline(file);
        };
        Self::remap_outline(entry.mapper.as_ref(), self.inner.outline(file))
    }

    fn inlay_hints(&self, file: &Url, span: TextSpan) -> Vec<InlayHint> {
        let Some(entry) = self.session.entry_for(file) else {
            return self.inner.inlay_hints(file, span);
        };
        let expanded = entry.mapper.map_span_to_expanded(span.start, span.length);
        let hints = self.inner.inlay_hints(file, expanded);
        let total = hints.len();
        let remapped: Vec<InlayHint> = hints
            .into_iter()
            .filter_map(|hint| {
                let position = entry.mapper.expanded_to_original(hint.position)?;
                Some(InlayHint { position, ..hint })
            })
            .collect();
        log_dropped(file, "inlay hint", total - remapped.len());
        remapped
    }
}

fn log_dropped(file: &Url, kind: &str, count: usize) {
    if count > 0 {
        log::debug!(
            target: "utsushi::remap",
            "Dropped {} {} result(s) in generated code of {}",
            count,
            kind,
            file
        );
    }
}
