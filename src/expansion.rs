//! Expansion cache and the interfaces of the external expander.

mod cache;
mod expander;
mod in_progress;
mod provider;
mod version;

pub use cache::{ExpansionCache, ExpansionEntry, ExpansionOutcome, MappingState};
pub use expander::{
    ExpandOptions, ExpandRequest, Expander, ExpanderDiagnostic, ExpanderError, ExpanderSeverity,
    ExpansionOutput,
};
pub use provider::{
    DirectiveInvocation, DirectiveProvider, ProviderManifest, ProviderResolver, ResolvedProvider,
};
pub use version::ContentVersion;
