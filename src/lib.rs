pub mod config;
pub mod error;
pub mod expansion;
pub mod host;
pub mod lsp;
pub mod mapping;
pub mod remap;
pub mod session;
pub mod virtual_decl;

pub use config::{ConfigError, Settings};
pub use error::{UtsushiError, UtsushiResult};
pub use expansion::{ContentVersion, ExpansionCache, ExpansionEntry, Expander, MappingState};
pub use host::{AnalysisService, ExpandingSourceHost, SourceHost};
pub use mapping::{IdentityMapper, PositionMapper, SegmentMap, TextSpan};
pub use remap::RemappingService;
pub use session::{ExpansionSession, FileClass};
pub use virtual_decl::{VirtualDeclarationRegistry, virtual_name_of};
