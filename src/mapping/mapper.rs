use std::fmt::Debug;

use super::segment::{Bias, SegmentMap};
use super::span::TextSpan;

/// Query interface translating offsets between original and expanded text.
///
/// Forward mapping (original → expanded) is total. Reverse mapping returns
/// `None` for offsets inside generated-only text, which is the one outcome
/// every consumer has to handle explicitly.
pub trait PositionMapper: Debug + Send + Sync {
    /// Map an original offset into expanded space.
    fn to_expanded(&self, pos: usize, bias: Bias) -> usize;

    /// Map an expanded offset back into original space.
    fn to_original(&self, pos: usize, bias: Bias) -> Option<usize>;

    /// Label of the producer that generated the text at `pos`.
    fn generated_by(&self, pos: usize) -> Option<&str>;

    /// Whether this mapper is the pass-through [`IdentityMapper`].
    fn is_identity(&self) -> bool {
        false
    }

    fn original_to_expanded(&self, pos: usize) -> usize {
        self.to_expanded(pos, Bias::Start)
    }

    /// Map a single expanded offset back into original space.
    ///
    /// Returns `None` only for offsets inside generated-only text.
    fn expanded_to_original(&self, pos: usize) -> Option<usize> {
        self.to_original(pos, Bias::Start)
    }

    fn is_in_generated(&self, pos: usize) -> bool {
        self.generated_by(pos).is_some()
    }

    /// Map an expanded span to original space.
    ///
    /// Returns `None` when either endpoint lands in generated text.
    fn map_span_to_original(&self, start: usize, length: usize) -> Option<TextSpan> {
        let mapped_start = self.to_original(start, Bias::Start)?;
        let mapped_end = if length == 0 {
            mapped_start
        } else {
            self.to_original(start.saturating_add(length), Bias::End)?
        };
        Some(TextSpan::from_bounds(mapped_start, mapped_end))
    }

    fn map_span_to_expanded(&self, start: usize, length: usize) -> TextSpan {
        let mapped_start = self.to_expanded(start, Bias::Start);
        let mapped_end = if length == 0 {
            mapped_start
        } else {
            self.to_expanded(start.saturating_add(length), Bias::End)
        };
        TextSpan::from_bounds(mapped_start, mapped_end)
    }
}

/// Pass-through mapper used when the expander produced no segment map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityMapper;

impl PositionMapper for IdentityMapper {
    fn to_expanded(&self, pos: usize, _bias: Bias) -> usize {
        pos
    }

    fn to_original(&self, pos: usize, _bias: Bias) -> Option<usize> {
        Some(pos)
    }

    fn generated_by(&self, _pos: usize) -> Option<&str> {
        None
    }

    fn is_identity(&self) -> bool {
        true
    }
}

impl PositionMapper for SegmentMap {
    fn to_expanded(&self, pos: usize, bias: Bias) -> usize {
        self.original_to_expanded_biased(pos, bias)
    }

    fn to_original(&self, pos: usize, bias: Bias) -> Option<usize> {
        self.expanded_to_original_biased(pos, bias)
    }

    fn expanded_to_original(&self, pos: usize) -> Option<usize> {
        self.expanded_to_original_at(pos)
    }

    fn generated_by(&self, pos: usize) -> Option<&str> {
        self.generated_at(pos, Bias::Start)
            .map(|region| region.producer_label.as_str())
    }
}
