//! Shared fixtures: a fixed annotated source and an expander for it.
//!
//! ```text
//! original (40 bytes):  [0..10 "class A {}"][10..25 "@derive(Debug) "][25..40 "class User {  }"]
//! expanded (55 bytes):  [0..10 "class A {}"][10..40 generated by Debug ][40..55 "class User {  }"]
//! ```

use std::sync::Arc;

use url::Url;
use utsushi::expansion::{
    ExpandRequest, Expander, ExpanderDiagnostic, ExpanderError, ExpansionOutput,
};
use utsushi::mapping::{GeneratedRegion, Segment, SegmentMap, SegmentMapping};

pub const ANNOTATED: &str = "class A {}@derive(Debug) class User {  }";
pub const PLAIN: &str = "class Plain { name = 'plain'; }";
pub const GENERATED: &str = "toString() { return 'User'; } ";

pub fn url(path: &str) -> Url {
    Url::parse(&format!("file:///project/{}", path)).unwrap()
}

pub fn debug_mapping() -> SegmentMapping {
    SegmentMapping {
        segments: vec![Segment::new(0, 10, 0, 10), Segment::new(25, 40, 40, 55)],
        generated_regions: vec![GeneratedRegion::new(10, 40, "Debug")],
    }
}

pub fn debug_map() -> SegmentMap {
    SegmentMap::from_mapping(debug_mapping()).unwrap()
}

/// Expander for sources laid out like [`ANNOTATED`].
///
/// Sources containing `@derive(Broken)` fail; sources without `@derive`
/// produce no declarations.
pub fn debug_expander(diagnostics: Vec<ExpanderDiagnostic>) -> Arc<dyn Expander> {
    Arc::new(
        move |request: &ExpandRequest<'_>| -> Result<ExpansionOutput, ExpanderError> {
            let source = request.source;
            if source.contains("@derive(Broken)") {
                return Err(ExpanderError::new("unknown derive 'Broken'"));
            }
            if source.len() != ANNOTATED.len() {
                return Ok(ExpansionOutput {
                    code: source.to_string(),
                    ..Default::default()
                });
            }
            Ok(ExpansionOutput {
                code: format!("{}{}{}", &source[..10], GENERATED, &source[25..]),
                declarations: Some("export declare function toString(): string;".to_string()),
                diagnostics: diagnostics.clone(),
                segment_mapping: Some(debug_mapping()),
            })
        },
    )
}
