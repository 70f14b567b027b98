//! Position mapping properties over a realistic segment map.

mod helpers;

use helpers::fixtures::{debug_map, debug_mapping};
use rstest::rstest;
use utsushi::mapping::{
    GeneratedRegion, IdentityMapper, PositionMapper, Segment, SegmentMap, SegmentMapping, TextSpan,
};

#[test]
fn scenario_a_span_before_generated_region() {
    let map = SegmentMap::from_mapping(SegmentMapping {
        segments: vec![Segment::new(0, 10, 0, 10)],
        generated_regions: vec![GeneratedRegion::new(10, 40, "Debug")],
    })
    .unwrap();

    assert_eq!(map.map_span_to_original(5, 3), Some(TextSpan::new(5, 3)));
    assert_eq!(map.map_span_to_original(15, 5), None);
}

#[test]
fn scenario_b_identity_mapper() {
    let mapper = IdentityMapper;

    assert_eq!(mapper.original_to_expanded(42), 42);
    assert_eq!(mapper.map_span_to_original(10, 5), Some(TextSpan::new(10, 5)));
}

#[rstest]
#[case(0)]
#[case(9)]
#[case(25)]
#[case(31)]
#[case(39)]
fn original_offsets_round_trip(#[case] pos: usize) {
    let map = debug_map();

    let expanded = map.original_to_expanded(pos);

    assert_eq!(map.expanded_to_original(expanded), Some(pos));
}

#[rstest]
#[case::first_segment(Segment::new(0, 10, 0, 10))]
#[case::second_segment(Segment::new(25, 40, 40, 55))]
fn expanded_offsets_round_trip_over_closed_segment(#[case] segment: Segment) {
    let map = debug_map();

    for pos in segment.expanded_start..=segment.expanded_end {
        let original = map
            .expanded_to_original(pos)
            .unwrap_or_else(|| panic!("{} has no original position", pos));
        assert_eq!(map.original_to_expanded(original), pos, "round trip at {}", pos);
    }
}

#[test]
fn scenario_a_round_trips_through_segment_end() {
    let map = SegmentMap::from_mapping(SegmentMapping {
        segments: vec![Segment::new(0, 10, 0, 10)],
        generated_regions: vec![GeneratedRegion::new(10, 40, "Debug")],
    })
    .unwrap();

    for pos in 0..=10 {
        assert_eq!(map.expanded_to_original(pos), Some(pos));
        assert_eq!(map.original_to_expanded(pos), pos);
    }
    assert_eq!(map.expanded_to_original(11), None);
}

#[test]
fn forward_mapping_is_monotonic() {
    let map = debug_map();

    let mapped: Vec<usize> = (0..80).map(|p| map.original_to_expanded(p)).collect();

    for pair in mapped.windows(2) {
        assert!(pair[0] <= pair[1], "not monotonic: {:?}", mapped);
    }
}

#[test]
fn reverse_mapping_is_monotonic_where_defined() {
    let map = debug_map();

    let mapped: Vec<usize> = (0..80)
        .filter_map(|p| map.expanded_to_original(p))
        .collect();

    for pair in mapped.windows(2) {
        assert!(pair[0] <= pair[1], "not monotonic: {:?}", mapped);
    }
}

#[test]
fn generated_region_has_no_original_position() {
    let map = debug_map();

    for pos in 10..40 {
        assert!(map.is_in_generated(pos), "{} should be generated", pos);
        assert_eq!(map.generated_by(pos), Some("Debug"));
    }
    // 10 is also the closed end of the first segment, which takes precedence.
    for pos in 11..40 {
        assert_eq!(map.expanded_to_original(pos), None);
    }
    assert_eq!(map.expanded_to_original(10), Some(10));
    assert!(!map.is_in_generated(9));
    assert!(!map.is_in_generated(40));
}

#[rstest]
#[case::inside_first_segment(2, 6, Some(TextSpan::new(2, 6)))]
#[case::ends_at_generated_start(5, 5, Some(TextSpan::new(5, 5)))]
#[case::starts_in_generated(12, 3, None)]
#[case::ends_in_generated(8, 5, None)]
#[case::crosses_generated(5, 40, Some(TextSpan::new(5, 25)))]
#[case::inside_second_segment(46, 4, Some(TextSpan::new(31, 4)))]
#[case::empty_at_segment_start(40, 0, Some(TextSpan::new(25, 0)))]
fn span_to_original(#[case] start: usize, #[case] length: usize, #[case] expected: Option<TextSpan>) {
    assert_eq!(debug_map().map_span_to_original(start, length), expected);
}

#[test]
fn annotation_text_maps_to_generated_boundary() {
    let map = debug_map();

    // The stripped annotation has no expanded text of its own.
    for pos in 11..25 {
        assert_eq!(map.original_to_expanded(pos), 10);
    }
    assert_eq!(map.original_to_expanded(25), 40);
}

#[test]
fn offsets_after_last_segment_keep_its_delta() {
    let map = debug_map();

    assert_eq!(map.original_to_expanded(45), 60);
    assert_eq!(map.expanded_to_original(60), Some(45));
}

#[test]
fn span_to_expanded_covers_the_same_text() {
    let map = debug_map();
    assert_eq!(map.map_span_to_expanded(27, 6), TextSpan::new(42, 6));
}

#[test]
fn mapping_deserializes_from_expander_json() {
    let json = r#"{
        "segments": [
            {"originalStart": 0, "originalEnd": 10, "expandedStart": 0, "expandedEnd": 10},
            {"originalStart": 25, "originalEnd": 40, "expandedStart": 40, "expandedEnd": 55}
        ],
        "generatedRegions": [{"start": 10, "end": 40, "producerLabel": "Debug"}]
    }"#;

    let mapping: SegmentMapping = serde_json::from_str(json).unwrap();

    assert_eq!(mapping, debug_mapping());
}
