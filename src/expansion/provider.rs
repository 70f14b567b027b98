//! Typed provider manifests for externally supplied directives.
//!
//! Discovery of providers happens elsewhere; this module only holds the
//! resolved manifests and the callables bound to their entry points, so
//! resolving a directive is a plain data lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use super::expander::ExpanderError;

/// Declares which directives an external provider implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderManifest {
    pub name: String,
    pub entry_point: String,
    #[serde(default)]
    pub directives: Vec<String>,
}

/// One directive application handed to a provider.
pub struct DirectiveInvocation<'a> {
    pub directive: &'a str,
    /// Source text of the annotated declaration.
    pub target: &'a str,
    pub file: &'a Url,
}

/// Callable that performs one directive's expansion.
pub trait DirectiveProvider: Send + Sync {
    fn expand_directive(&self, invocation: &DirectiveInvocation<'_>) -> Result<String, ExpanderError>;
}

impl<F> DirectiveProvider for F
where
    F: Fn(&DirectiveInvocation<'_>) -> Result<String, ExpanderError> + Send + Sync,
{
    fn expand_directive(&self, invocation: &DirectiveInvocation<'_>) -> Result<String, ExpanderError> {
        self(invocation)
    }
}

/// A directive resolved to its manifest and bound callable.
pub struct ResolvedProvider<'a> {
    pub manifest: &'a ProviderManifest,
    pub provider: Arc<dyn DirectiveProvider>,
}

/// Directive name → provider lookup.
#[derive(Default)]
pub struct ProviderResolver {
    manifests: Vec<ProviderManifest>,
    by_directive: HashMap<String, usize>,
    entry_points: HashMap<String, Arc<dyn DirectiveProvider>>,
}

impl ProviderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index manifests by directive. A directive claimed by two manifests
    /// stays with the first one.
    pub fn from_manifests(manifests: Vec<ProviderManifest>) -> Self {
        let mut by_directive = HashMap::new();
        for (index, manifest) in manifests.iter().enumerate() {
            for directive in &manifest.directives {
                if let Some(&owner) = by_directive.get(directive) {
                    let owner: &ProviderManifest = &manifests[owner];
                    log::warn!(
                        target: "utsushi::providers",
                        "Directive '{}' is claimed by both '{}' and '{}'; keeping '{}'",
                        directive,
                        owner.name,
                        manifest.name,
                        owner.name
                    );
                    continue;
                }
                by_directive.insert(directive.clone(), index);
            }
        }

        Self {
            manifests,
            by_directive,
            entry_points: HashMap::new(),
        }
    }

    /// Bind a callable to a manifest entry point.
    pub fn bind(&mut self, entry_point: impl Into<String>, provider: Arc<dyn DirectiveProvider>) {
        self.entry_points.insert(entry_point.into(), provider);
    }

    /// Resolve a directive name.
    ///
    /// Returns `None` when the directive is not an external provider's, or
    /// when its manifest has no bound entry point.
    pub fn resolve(&self, directive: &str) -> Option<ResolvedProvider<'_>> {
        let manifest = &self.manifests[*self.by_directive.get(directive)?];
        let Some(provider) = self.entry_points.get(&manifest.entry_point) else {
            log::debug!(
                target: "utsushi::providers",
                "Provider '{}' for directive '{}' has no bound entry point '{}'",
                manifest.name,
                directive,
                manifest.entry_point
            );
            return None;
        };
        Some(ResolvedProvider {
            manifest,
            provider: Arc::clone(provider),
        })
    }

    pub fn manifests(&self) -> &[ProviderManifest] {
        &self.manifests
    }

    /// Manifests whose entry point has nothing bound to it.
    pub fn unbound(&self) -> impl Iterator<Item = &ProviderManifest> {
        self.manifests
            .iter()
            .filter(|m| !self.entry_points.contains_key(&m.entry_point))
    }
}

impl fmt::Debug for ProviderResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderResolver")
            .field("manifests", &self.manifests)
            .field("bound", &self.entry_points.keys().collect::<Vec<_>>())
            .finish()
    }
}
