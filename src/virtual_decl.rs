//! Virtual declaration units generated alongside expansion.

mod name;
mod registry;

pub use name::{DECLARATION_INFIX, EXPANDED_INFIX, is_expander_output, virtual_name_of};
pub use registry::{VirtualDeclarationRegistry, VirtualDeclarationUnit};
