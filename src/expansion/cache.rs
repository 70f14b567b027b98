//! Per-file expansion cache.
//!
//! `ExpansionCache` is the only component that invokes the external
//! expander. It guarantees:
//!
//! - the expander runs at most once per distinct content version per file;
//! - a nested request for a file that is already expanding returns the
//!   original text with an identity mapper instead of recursing;
//! - expander failures (errors, panics, invalid segment maps) degrade to a
//!   pass-through entry and never reach the caller.
//!
//! ## Lifecycle
//!
//! ```text
//! Unmapped ──get──▶ Expanding ──ok──────▶ Mapped
//!                       │
//!                       └──fail/empty──▶ DegradedMapped
//! ```
//!
//! A new content version sends the file back through `Expanding` on the
//! next `get`. Entries are replaced as a whole, never edited in place.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use dashmap::DashMap;
use url::Url;

use super::expander::{ExpandOptions, ExpandRequest, Expander, ExpanderDiagnostic};
use super::in_progress::InProgressSet;
use super::provider::ProviderResolver;
use super::version::ContentVersion;
use crate::mapping::{IdentityMapper, PositionMapper, SegmentMap};
use crate::virtual_decl::VirtualDeclarationRegistry;

/// How an entry came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionOutcome {
    /// The expander ran and its output was accepted.
    Expanded,
    /// Empty or whitespace-only content; the expander was not invoked.
    Skipped,
    /// The expander failed; the message is kept for reporting.
    Failed(String),
    /// Nested request for a file already being expanded.
    Reentrant,
}

/// Mapping lifecycle state of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    Unmapped,
    Expanding,
    /// A real segment map is available.
    Mapped,
    /// Only the identity mapper is available.
    DegradedMapped,
}

/// Cached expansion result for one file version.
#[derive(Debug)]
pub struct ExpansionEntry {
    pub version: ContentVersion,
    pub code: String,
    pub declarations: Option<String>,
    pub diagnostics: Vec<ExpanderDiagnostic>,
    pub mapper: Arc<dyn PositionMapper>,
    pub outcome: ExpansionOutcome,
}

impl ExpansionEntry {
    /// Entry that forwards the original content untouched.
    pub fn pass_through(content: &str, version: &ContentVersion, outcome: ExpansionOutcome) -> Self {
        Self {
            version: version.clone(),
            code: content.to_string(),
            declarations: None,
            diagnostics: Vec::new(),
            mapper: Arc::new(IdentityMapper),
            outcome,
        }
    }

    pub fn state(&self) -> MappingState {
        if self.mapper.is_identity() {
            MappingState::DegradedMapped
        } else {
            MappingState::Mapped
        }
    }
}

pub struct ExpansionCache {
    expander: Arc<dyn Expander>,
    providers: Arc<ProviderResolver>,
    registry: Arc<VirtualDeclarationRegistry>,
    options: ArcSwap<ExpandOptions>,
    entries: DashMap<Url, Arc<ExpansionEntry>>,
    in_progress: InProgressSet<Url>,
    invocations: AtomicUsize,
}

impl ExpansionCache {
    pub fn new(
        expander: Arc<dyn Expander>,
        providers: Arc<ProviderResolver>,
        registry: Arc<VirtualDeclarationRegistry>,
        options: ExpandOptions,
    ) -> Self {
        Self {
            expander,
            providers,
            registry,
            options: ArcSwap::from_pointee(options),
            entries: DashMap::new(),
            in_progress: InProgressSet::new(),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Return the entry for `version`, expanding `content` if needed.
    pub fn get(&self, file: &Url, content: &str, version: &ContentVersion) -> Arc<ExpansionEntry> {
        if let Some(entry) = self.current(file, version) {
            log::debug!(
                target: "utsushi::cache",
                "Cache HIT: {} at version {}",
                file,
                version
            );
            return entry;
        }

        if content.trim().is_empty() {
            let entry = Arc::new(ExpansionEntry::pass_through(
                content,
                version,
                ExpansionOutcome::Skipped,
            ));
            self.publish(file, Arc::clone(&entry));
            return entry;
        }

        let Some(_guard) = self.in_progress.try_start(file) else {
            log::warn!(
                target: "utsushi::cache",
                "Reentrant expansion of {} at version {} short-circuited to original content",
                file,
                version
            );
            return Arc::new(ExpansionEntry::pass_through(
                content,
                version,
                ExpansionOutcome::Reentrant,
            ));
        };

        log::debug!(
            target: "utsushi::cache",
            "Cache MISS: expanding {} at version {}",
            file,
            version
        );
        let entry = Arc::new(self.expand(file, content, version));
        self.publish(file, Arc::clone(&entry));
        entry
    }

    /// Live entry for a file regardless of version.
    pub fn peek(&self, file: &Url) -> Option<Arc<ExpansionEntry>> {
        self.entries.get(file).map(|entry| Arc::clone(entry.value()))
    }

    pub fn state(&self, file: &Url) -> MappingState {
        if self.in_progress.contains(file) {
            return MappingState::Expanding;
        }
        self.peek(file)
            .map_or(MappingState::Unmapped, |entry| entry.state())
    }

    /// Drop a file's entry and its declaration unit (e.g. on close).
    pub fn remove(&self, file: &Url) -> Option<Arc<ExpansionEntry>> {
        self.registry.unregister(file);
        self.entries.remove(file).map(|(_, entry)| entry)
    }

    /// Replace expander options. Every entry was produced with the old
    /// options, so all of them are dropped.
    pub fn set_options(&self, options: ExpandOptions) {
        if **self.options.load() == options {
            return;
        }
        self.options.store(Arc::new(options));
        let dropped = self.clear();
        log::info!(
            target: "utsushi::cache",
            "Expand options changed; dropped {} cached expansions",
            dropped
        );
    }

    /// Drop every entry and its declaration unit. Returns the number of
    /// entries dropped.
    pub fn clear(&self) -> usize {
        let files: Vec<Url> = self.entries.iter().map(|e| e.key().clone()).collect();
        for file in &files {
            self.remove(file);
        }
        files.len()
    }

    pub fn options(&self) -> Arc<ExpandOptions> {
        self.options.load_full()
    }

    /// Number of times the expander has been invoked.
    pub fn invocation_count(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn current(&self, file: &Url, version: &ContentVersion) -> Option<Arc<ExpansionEntry>> {
        self.peek(file).filter(|entry| entry.version == *version)
    }

    fn expand(&self, file: &Url, content: &str, version: &ContentVersion) -> ExpansionEntry {
        let options = self.options.load_full();
        let request = ExpandRequest {
            source: content,
            file,
            options: options.as_ref(),
            providers: self.providers.as_ref(),
        };

        self.invocations.fetch_add(1, Ordering::Relaxed);
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.expander.expand(&request)));

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                log::warn!(
                    target: "utsushi::cache",
                    "Expansion of {} failed: {}",
                    file,
                    err
                );
                return ExpansionEntry::pass_through(
                    content,
                    version,
                    ExpansionOutcome::Failed(err.to_string()),
                );
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!(
                    target: "utsushi::cache",
                    "Expander panicked on {}: {}",
                    file,
                    message
                );
                return ExpansionEntry::pass_through(
                    content,
                    version,
                    ExpansionOutcome::Failed(message),
                );
            }
        };

        let mapper: Arc<dyn PositionMapper> = match output.segment_mapping {
            Some(mapping) => match SegmentMap::from_mapping(mapping) {
                Ok(map) => Arc::new(map),
                Err(err) => {
                    log::warn!(
                        target: "utsushi::cache",
                        "Discarding expansion of {}: invalid segment mapping: {}",
                        file,
                        err
                    );
                    return ExpansionEntry::pass_through(
                        content,
                        version,
                        ExpansionOutcome::Failed(err.to_string()),
                    );
                }
            },
            None => Arc::new(IdentityMapper),
        };

        ExpansionEntry {
            version: version.clone(),
            code: output.code,
            declarations: output.declarations.filter(|d| !d.trim().is_empty()),
            diagnostics: output.diagnostics,
            mapper,
            outcome: ExpansionOutcome::Expanded,
        }
    }

    /// Store an entry and bring the declaration registry in line with it.
    fn publish(&self, file: &Url, entry: Arc<ExpansionEntry>) {
        match entry.declarations.as_deref() {
            Some(declarations) => {
                self.registry.register(file, declarations, &entry.version);
            }
            None => {
                self.registry.unregister(file);
            }
        }
        self.entries.insert(file.clone(), entry);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "expander panicked".to_string()
    }
}
