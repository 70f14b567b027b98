//! Bidirectional position mapping between original and expanded source.

mod mapper;
mod segment;
mod span;

pub use mapper::{IdentityMapper, PositionMapper};
pub use segment::{Bias, GeneratedRegion, Segment, SegmentMap, SegmentMapError, SegmentMapping};
pub use span::TextSpan;
