//! Segment map between original and expanded coordinate spaces.
//!
//! A [`SegmentMap`] is built once per successful expansion from the
//! expander's raw [`SegmentMapping`] and never mutated afterwards. A newer
//! content version produces a new map that replaces the old one wholesale.
//!
//! ## Layout
//!
//! ```text
//! original:  [ seg A ][ annotation ][ seg B        ]
//!               │                      │
//! expanded:  [ seg A ][ generated "Debug" ][ seg B        ]
//! ```
//!
//! Every expanded offset lies in a segment, in a generated region, or in the
//! implicit prefix before the first segment (treated as 1:1 identity).

use std::fmt;

use rust_lapper::{Interval, Lapper};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A correspondence between an original byte range and an expanded byte range.
///
/// The two lengths may differ, e.g. when the expander strips annotation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub original_start: usize,
    pub original_end: usize,
    pub expanded_start: usize,
    pub expanded_end: usize,
}

impl Segment {
    pub fn new(
        original_start: usize,
        original_end: usize,
        expanded_start: usize,
        expanded_end: usize,
    ) -> Self {
        Self {
            original_start,
            original_end,
            expanded_start,
            expanded_end,
        }
    }

    /// A segment whose original and expanded ranges are the same bytes.
    pub fn identity(start: usize, end: usize) -> Self {
        Self::new(start, end, start, end)
    }

    fn is_inverted(&self) -> bool {
        self.original_end < self.original_start || self.expanded_end < self.expanded_start
    }
}

/// A range of expanded text with no original counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRegion {
    pub start: usize,
    pub end: usize,
    pub producer_label: String,
}

impl GeneratedRegion {
    pub fn new(start: usize, end: usize, producer_label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            producer_label: producer_label.into(),
        }
    }
}

/// Raw mapping data as reported by the expander, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMapping {
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub generated_regions: Vec<GeneratedRegion>,
}

/// Invariant violations detected while building a [`SegmentMap`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentMapError {
    #[error("segment {index} has an end before its start")]
    InvertedSegment { index: usize },

    #[error("generated region {index} has an end before its start")]
    InvertedRegion { index: usize },

    #[error("segments overlap in expanded space: {first:?} and {second:?}")]
    OverlappingSegments { first: Segment, second: Segment },

    #[error("segments are not ordered in original space: {first:?} and {second:?}")]
    NonMonotonicSegments { first: Segment, second: Segment },

    #[error("generated regions overlap at {start}..{end}")]
    OverlappingRegions { start: usize, end: usize },

    #[error("generated region {start}..{end} overlaps segment {segment:?}")]
    RegionOverlapsSegment {
        start: usize,
        end: usize,
        segment: Segment,
    },
}

/// Which side of a shared boundary a lookup resolves to.
///
/// Span starts use [`Bias::Start`]: an offset belongs to the range that
/// begins there. Span ends are exclusive and use [`Bias::End`]: an offset
/// belongs to the range that ends there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Space {
    Original,
    Expanded,
}

impl Space {
    fn range(self, segment: &Segment) -> (usize, usize) {
        match self {
            Space::Original => (segment.original_start, segment.original_end),
            Space::Expanded => (segment.expanded_start, segment.expanded_end),
        }
    }

    fn other(self) -> Space {
        match self {
            Space::Original => Space::Expanded,
            Space::Expanded => Space::Original,
        }
    }
}

enum Lookup<'a> {
    /// Strictly inside the segment for the requested bias.
    Inside(&'a Segment),
    /// On the segment's edge opposite to the bias.
    Boundary(&'a Segment),
    Outside,
}

/// Validated, immutable correspondence between original and expanded text.
pub struct SegmentMap {
    segments: Vec<Segment>,
    generated: Vec<GeneratedRegion>,
    /// Interval index over `generated`; each value is an index into it.
    generated_index: Lapper<usize, usize>,
}

impl SegmentMap {
    /// Validate raw expander output and build the map.
    ///
    /// Segments and regions may arrive in any order; they are sorted here.
    pub fn new(
        mut segments: Vec<Segment>,
        mut generated: Vec<GeneratedRegion>,
    ) -> Result<Self, SegmentMapError> {
        if let Some(index) = segments.iter().position(Segment::is_inverted) {
            return Err(SegmentMapError::InvertedSegment { index });
        }
        if let Some(index) = generated.iter().position(|r| r.end < r.start) {
            return Err(SegmentMapError::InvertedRegion { index });
        }

        segments.sort_by_key(|s| (s.expanded_start, s.expanded_end));
        for pair in segments.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if second.expanded_start < first.expanded_end {
                return Err(SegmentMapError::OverlappingSegments { first, second });
            }
            if second.original_start < first.original_end {
                return Err(SegmentMapError::NonMonotonicSegments { first, second });
            }
        }

        generated.sort_by_key(|r| (r.start, r.end));
        for pair in generated.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(SegmentMapError::OverlappingRegions {
                    start: pair[1].start,
                    end: pair[1].end,
                });
            }
        }

        for region in generated.iter().filter(|r| r.start < r.end) {
            let first = segments.partition_point(|s| s.expanded_end <= region.start);
            let overlapping = segments[first..]
                .iter()
                .take_while(|s| s.expanded_start < region.end)
                .find(|s| s.expanded_start < s.expanded_end);
            if let Some(segment) = overlapping {
                return Err(SegmentMapError::RegionOverlapsSegment {
                    start: region.start,
                    end: region.end,
                    segment: *segment,
                });
            }
        }

        let generated_index = Lapper::new(
            generated
                .iter()
                .enumerate()
                .filter(|(_, r)| r.start < r.end)
                .map(|(index, r)| Interval {
                    start: r.start,
                    stop: r.end,
                    val: index,
                })
                .collect(),
        );

        Ok(Self {
            segments,
            generated,
            generated_index,
        })
    }

    /// Build from the expander's serialized mapping.
    pub fn from_mapping(mapping: SegmentMapping) -> Result<Self, SegmentMapError> {
        Self::new(mapping.segments, mapping.generated_regions)
    }

    /// Segments sorted by expanded (and therefore original) start.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn generated_regions(&self) -> &[GeneratedRegion] {
        &self.generated
    }

    /// Generated region covering `pos`, if any.
    pub(crate) fn generated_at(&self, pos: usize, bias: Bias) -> Option<&GeneratedRegion> {
        let (low, high) = match bias {
            Bias::Start => (pos, pos.saturating_add(1)),
            Bias::End => (pos.checked_sub(1)?, pos),
        };
        self.generated_index
            .find(low, high)
            .next()
            .map(|interval| &self.generated[interval.val])
    }

    pub(crate) fn original_to_expanded_biased(&self, pos: usize, bias: Bias) -> usize {
        match self.locate(pos, Space::Original, bias) {
            Lookup::Inside(segment) | Lookup::Boundary(segment) => {
                project(segment, pos, Space::Original)
            }
            Lookup::Outside => self.extrapolate(pos, Space::Original),
        }
    }

    pub(crate) fn expanded_to_original_biased(&self, pos: usize, bias: Bias) -> Option<usize> {
        match self.locate(pos, Space::Expanded, bias) {
            Lookup::Inside(segment) => Some(project(segment, pos, Space::Expanded)),
            _ if self.generated_at(pos, bias).is_some() => None,
            Lookup::Boundary(segment) => Some(project(segment, pos, Space::Expanded)),
            Lookup::Outside => Some(self.extrapolate(pos, Space::Expanded)),
        }
    }

    /// Map a single expanded offset.
    ///
    /// Segments are closed ranges here: an offset on a segment's end belongs
    /// to the segment even when a generated region starts at the same offset.
    pub(crate) fn expanded_to_original_at(&self, pos: usize) -> Option<usize> {
        match self.locate(pos, Space::Expanded, Bias::Start) {
            Lookup::Inside(segment) | Lookup::Boundary(segment) => {
                Some(project(segment, pos, Space::Expanded))
            }
            Lookup::Outside if self.generated_at(pos, Bias::Start).is_some() => None,
            Lookup::Outside => Some(self.extrapolate(pos, Space::Expanded)),
        }
    }

    fn locate(&self, pos: usize, from: Space, bias: Bias) -> Lookup<'_> {
        let first = self.segments.partition_point(|s| from.range(s).1 < pos);
        let mut boundary = None;
        for segment in self.segments[first..]
            .iter()
            .take_while(|s| from.range(s).0 <= pos)
        {
            let (start, end) = from.range(segment);
            let inside = match bias {
                Bias::Start => pos < end,
                Bias::End => start < pos,
            };
            if inside {
                return Lookup::Inside(segment);
            }
            boundary.get_or_insert(segment);
        }
        boundary.map_or(Lookup::Outside, Lookup::Boundary)
    }

    /// Map an offset that no segment covers.
    ///
    /// Before the first segment the spaces are identical. In a gap between
    /// segments the offset snaps to the end of the preceding segment. After
    /// the last segment the preceding segment's delta is carried forward.
    fn extrapolate(&self, pos: usize, from: Space) -> usize {
        let after = self.segments.partition_point(|s| from.range(s).1 < pos);
        let Some(previous) = after.checked_sub(1).map(|i| &self.segments[i]) else {
            return pos;
        };
        let (_, from_end) = from.range(previous);
        let (_, to_end) = from.other().range(previous);
        if after < self.segments.len() {
            to_end
        } else {
            to_end.saturating_add(pos - from_end)
        }
    }
}

fn project(segment: &Segment, pos: usize, from: Space) -> usize {
    let (from_start, _) = from.range(segment);
    let (to_start, to_end) = from.other().range(segment);
    (to_start + pos.saturating_sub(from_start)).min(to_end)
}

impl fmt::Debug for SegmentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentMap")
            .field("segments", &self.segments)
            .field("generated", &self.generated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `#[derive(Debug)] class User { .. }` with the annotation stripped and
    /// a generated `toString` body inserted after the class header.
    ///
    /// original: 0..10 kept, 10..25 annotation, 25..40 kept
    /// expanded: 0..10 kept, 10..40 generated, 40..55 kept
    fn stripped_annotation_map() -> SegmentMap {
        SegmentMap::new(
            vec![Segment::new(0, 10, 0, 10), Segment::new(25, 40, 40, 55)],
            vec![GeneratedRegion::new(10, 40, "Debug")],
        )
        .unwrap()
    }

    #[test]
    fn new_sorts_out_of_order_input() {
        let map = SegmentMap::new(
            vec![Segment::new(25, 40, 40, 55), Segment::new(0, 10, 0, 10)],
            vec![GeneratedRegion::new(10, 40, "Debug")],
        )
        .unwrap();

        assert_eq!(map.segments()[0], Segment::new(0, 10, 0, 10));
        assert_eq!(map.segments()[1], Segment::new(25, 40, 40, 55));
    }

    #[test]
    fn new_rejects_inverted_segment() {
        let err = SegmentMap::new(vec![Segment::new(10, 5, 0, 5)], vec![]).unwrap_err();
        assert_eq!(err, SegmentMapError::InvertedSegment { index: 0 });
    }

    #[test]
    fn new_rejects_overlapping_segments() {
        let err = SegmentMap::new(
            vec![Segment::new(0, 10, 0, 10), Segment::new(10, 20, 5, 15)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, SegmentMapError::OverlappingSegments { .. }));
    }

    #[test]
    fn new_rejects_segments_crossing_in_original_space() {
        let err = SegmentMap::new(
            vec![Segment::new(20, 30, 0, 10), Segment::new(0, 10, 10, 20)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, SegmentMapError::NonMonotonicSegments { .. }));
    }

    #[test]
    fn new_rejects_region_inside_segment() {
        let err = SegmentMap::new(
            vec![Segment::identity(0, 20)],
            vec![GeneratedRegion::new(5, 8, "Clone")],
        )
        .unwrap_err();
        assert!(matches!(err, SegmentMapError::RegionOverlapsSegment { .. }));
    }

    #[test]
    fn new_rejects_overlapping_regions() {
        let err = SegmentMap::new(
            vec![],
            vec![
                GeneratedRegion::new(0, 10, "Debug"),
                GeneratedRegion::new(5, 12, "Clone"),
            ],
        )
        .unwrap_err();
        assert_eq!(err, SegmentMapError::OverlappingRegions { start: 5, end: 12 });
    }

    #[test]
    fn touching_regions_and_segments_are_accepted() {
        let map = SegmentMap::new(
            vec![Segment::identity(0, 10), Segment::new(10, 20, 30, 40)],
            vec![
                GeneratedRegion::new(10, 20, "Debug"),
                GeneratedRegion::new(20, 30, "Clone"),
            ],
        );
        assert!(map.is_ok());
    }

    #[test]
    fn generated_at_respects_bias() {
        let map = stripped_annotation_map();

        assert_eq!(
            map.generated_at(10, Bias::Start).map(|r| r.producer_label.as_str()),
            Some("Debug")
        );
        assert!(map.generated_at(10, Bias::End).is_none());
        assert!(map.generated_at(40, Bias::Start).is_none());
        assert!(map.generated_at(40, Bias::End).is_some());
        assert!(map.generated_at(0, Bias::End).is_none());
    }

    #[test]
    fn removed_original_text_snaps_to_preceding_segment_end() {
        let map = stripped_annotation_map();

        assert_eq!(map.original_to_expanded_biased(15, Bias::Start), 10);
        assert_eq!(map.original_to_expanded_biased(24, Bias::Start), 10);
        assert_eq!(map.original_to_expanded_biased(25, Bias::Start), 40);
    }

    #[test]
    fn tail_after_last_segment_keeps_delta() {
        let map = stripped_annotation_map();

        assert_eq!(map.original_to_expanded_biased(45, Bias::Start), 60);
        assert_eq!(map.expanded_to_original_biased(60, Bias::Start), Some(45));
    }

    #[test]
    fn shared_boundary_resolves_by_bias() {
        // Two adjacent segments that meet at original 10 but are separated
        // by generated text in expanded space.
        let map = SegmentMap::new(
            vec![Segment::identity(0, 10), Segment::new(10, 20, 30, 40)],
            vec![GeneratedRegion::new(10, 30, "Debug")],
        )
        .unwrap();

        assert_eq!(map.original_to_expanded_biased(10, Bias::Start), 30);
        assert_eq!(map.original_to_expanded_biased(10, Bias::End), 10);
    }

    #[test]
    fn segment_end_touching_generated_text_maps_as_point() {
        let map = stripped_annotation_map();

        assert_eq!(map.expanded_to_original_at(10), Some(10));
        assert_eq!(map.expanded_to_original_at(11), None);
        assert_eq!(map.expanded_to_original_at(40), Some(25));
        assert_eq!(map.expanded_to_original_at(55), Some(40));
        // Span starts stay strict: the first byte at 10 is generated.
        assert_eq!(map.expanded_to_original_biased(10, Bias::Start), None);
    }

    #[test]
    fn shrinking_segment_clamps_projection() {
        // Expanded text is longer than the original: trailing bytes clamp.
        let map = SegmentMap::new(vec![Segment::new(0, 5, 0, 10)], vec![]).unwrap();

        assert_eq!(map.expanded_to_original_biased(3, Bias::Start), Some(3));
        assert_eq!(map.expanded_to_original_biased(8, Bias::Start), Some(5));
    }

    #[test]
    fn mapping_deserializes_from_camel_case_json() {
        let json = r#"{
            "segments": [
                {"originalStart": 0, "originalEnd": 10, "expandedStart": 0, "expandedEnd": 10}
            ],
            "generatedRegions": [
                {"start": 10, "end": 40, "producerLabel": "Debug"}
            ]
        }"#;
        let mapping: SegmentMapping = serde_json::from_str(json).unwrap();

        assert_eq!(mapping.segments, vec![Segment::identity(0, 10)]);
        assert_eq!(mapping.generated_regions[0].producer_label, "Debug");
        assert!(SegmentMap::from_mapping(mapping).is_ok());
    }
}
