//! Session-scoped expansion state.
//!
//! An [`ExpansionSession`] owns everything that would otherwise be global:
//! settings, the expansion cache and the virtual declaration registry. One
//! session exists per project; independent sessions never share state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use regex::Regex;
use url::Url;

use crate::config::{ConfigError, Settings};
use crate::expansion::{
    ContentVersion, DirectiveProvider, ExpansionCache, ExpansionEntry, Expander, MappingState,
    ProviderResolver,
};
use crate::host::SourceHost;
use crate::virtual_decl::{VirtualDeclarationRegistry, is_expander_output};

/// How a file is treated by the expansion layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// A registered virtual declaration unit.
    VirtualDeclaration,
    /// Named by the expanded/declaration convention.
    ExpanderOutput,
    /// Under one of the excluded directories.
    Excluded,
    /// Contains no expansion directive.
    NoDirectives,
    Expandable,
}

impl FileClass {
    /// Everything except `Expandable` is forwarded to the host untouched.
    pub fn is_bypassed(self) -> bool {
        self != FileClass::Expandable
    }
}

pub struct ExpansionSession {
    settings: ArcSwap<Settings>,
    directive_regex: ArcSwap<Regex>,
    registry: Arc<VirtualDeclarationRegistry>,
    cache: ExpansionCache,
    sources: Arc<dyn SourceHost>,
    /// Bumped on every settings reload.
    generation: AtomicU64,
}

impl ExpansionSession {
    /// Create a session whose providers are resolved from
    /// `settings.providers`, binding each given entry point.
    pub fn from_settings(
        settings: Settings,
        expander: Arc<dyn Expander>,
        entry_points: impl IntoIterator<Item = (String, Arc<dyn DirectiveProvider>)>,
        sources: Arc<dyn SourceHost>,
    ) -> Result<Self, ConfigError> {
        let mut providers = ProviderResolver::from_manifests(settings.providers.clone());
        for (entry_point, provider) in entry_points {
            providers.bind(entry_point, provider);
        }
        for manifest in providers.unbound() {
            log::warn!(
                target: "utsushi::providers",
                "Provider '{}' has no bound entry point '{}'",
                manifest.name,
                manifest.entry_point
            );
        }
        Self::new(settings, expander, providers, sources)
    }

    /// Create a session with an explicitly built provider resolver.
    pub fn new(
        settings: Settings,
        expander: Arc<dyn Expander>,
        providers: ProviderResolver,
        sources: Arc<dyn SourceHost>,
    ) -> Result<Self, ConfigError> {
        let directive_regex = settings.directive_regex()?;
        let registry = Arc::new(VirtualDeclarationRegistry::new());
        let cache = ExpansionCache::new(
            expander,
            Arc::new(providers),
            Arc::clone(&registry),
            settings.expand.clone(),
        );
        Ok(Self {
            settings: ArcSwap::from_pointee(settings),
            directive_regex: ArcSwap::from_pointee(directive_regex),
            registry,
            cache,
            sources,
            generation: AtomicU64::new(0),
        })
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    pub fn registry(&self) -> &Arc<VirtualDeclarationRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &ExpansionCache {
        &self.cache
    }

    pub fn sources(&self) -> &Arc<dyn SourceHost> {
        &self.sources
    }

    /// Classify a file given its current content.
    pub fn classify(&self, file: &Url, content: &str) -> FileClass {
        if let Some(class) = self.classify_by_name(file) {
            return class;
        }
        if self.directive_regex.load().is_match(content) {
            FileClass::Expandable
        } else {
            FileClass::NoDirectives
        }
    }

    /// Whether queries on `file` go straight to the host.
    pub fn is_bypassed(&self, file: &Url) -> bool {
        if self.classify_by_name(file).is_some() {
            return true;
        }
        match self.sources.content(file) {
            Some(content) => self.classify(file, &content).is_bypassed(),
            None => true,
        }
    }

    /// Up-to-date expansion entry for `file`, or `None` when the file is
    /// bypassed or unknown to the source host.
    ///
    /// A file that lost its last directive has its stale entry dropped so
    /// its declaration unit disappears too.
    pub fn entry_for(&self, file: &Url) -> Option<Arc<ExpansionEntry>> {
        if self.classify_by_name(file).is_some() {
            return None;
        }
        let content = self.sources.content(file)?;
        if self.classify(file, &content) == FileClass::NoDirectives {
            if self.cache.remove(file).is_some() {
                log::debug!(
                    target: "utsushi::cache",
                    "Dropped expansion of {}: no directives left",
                    file
                );
            }
            return None;
        }
        let version = self
            .sources
            .version(file)
            .unwrap_or_else(|| ContentVersion::of_content(&content));
        Some(self.cache.get(file, &content, &version))
    }

    /// Number of settings reloads so far.
    pub fn settings_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Version to report for text produced by expansion. Expanded text
    /// changes on a settings reload even when its source did not, so the
    /// settings generation is part of the version.
    pub fn expanded_version(&self, version: &ContentVersion) -> ContentVersion {
        version.with_generation(self.settings_generation())
    }

    pub fn mapping_state(&self, file: &Url) -> MappingState {
        self.cache.state(file)
    }

    /// Forget a file (e.g. when its document is closed).
    pub fn close(&self, file: &Url) {
        self.cache.remove(file);
    }

    /// Replace the session settings and drop every cached expansion.
    ///
    /// The new directive pattern is validated first; on error the current
    /// settings stay in effect. Provider manifests are bound at session
    /// creation and are not rebound here.
    pub fn reload_settings(&self, settings: Settings) -> Result<(), ConfigError> {
        let directive_regex = settings.directive_regex()?;
        if settings.providers != self.settings.load().providers {
            log::warn!(
                target: "utsushi::config",
                "Provider manifests changed; they take effect in a new session"
            );
        }
        self.cache.set_options(settings.expand.clone());
        self.directive_regex.store(Arc::new(directive_regex));
        self.settings.store(Arc::new(settings));
        self.generation.fetch_add(1, Ordering::AcqRel);
        let dropped = self.cache.clear();
        log::info!(
            target: "utsushi::config",
            "Settings reloaded; {} cached expansions dropped",
            dropped
        );
        Ok(())
    }

    fn classify_by_name(&self, file: &Url) -> Option<FileClass> {
        if self.registry.has(file) {
            return Some(FileClass::VirtualDeclaration);
        }
        if is_expander_output(file) {
            return Some(FileClass::ExpanderOutput);
        }
        if self.is_excluded(file) {
            return Some(FileClass::Excluded);
        }
        None
    }

    fn is_excluded(&self, file: &Url) -> bool {
        let settings = self.settings.load();
        let Some(segments) = file.path_segments() else {
            return false;
        };
        segments
            .filter(|segment| !segment.is_empty())
            .any(|segment| settings.excluded_dirs.iter().any(|dir| dir == segment))
    }
}
