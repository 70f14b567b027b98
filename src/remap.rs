//! Result remapping between the host analysis service and original files.

mod diagnostics;
mod service;

pub use diagnostics::{from_expander, severity_of};
pub use service::RemappingService;
