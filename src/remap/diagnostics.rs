use crate::expansion::{ExpanderDiagnostic, ExpanderSeverity};
use crate::host::{Diagnostic, Severity};
use crate::mapping::TextSpan;

pub fn severity_of(severity: ExpanderSeverity) -> Severity {
    match severity {
        ExpanderSeverity::Error => Severity::Error,
        ExpanderSeverity::Warning => Severity::Warning,
        ExpanderSeverity::Info | ExpanderSeverity::Other => Severity::Information,
    }
}

/// Convert an expander diagnostic to the host shape.
///
/// Offsets are already in original coordinates and are copied unchanged.
/// A start without an end becomes an empty span; no start means no span.
pub fn from_expander(diagnostic: &ExpanderDiagnostic, source: &str) -> Diagnostic {
    let span = match (diagnostic.start, diagnostic.end) {
        (Some(start), Some(end)) => Some(TextSpan::from_bounds(start, end)),
        (Some(start), None) => Some(TextSpan::new(start, 0)),
        (None, _) => None,
    };
    Diagnostic {
        file: None,
        span,
        message: diagnostic.message.clone(),
        severity: severity_of(diagnostic.severity),
        code: None,
        source: Some(source.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ExpanderSeverity::Error, Severity::Error)]
    #[case(ExpanderSeverity::Warning, Severity::Warning)]
    #[case(ExpanderSeverity::Info, Severity::Information)]
    #[case(ExpanderSeverity::Other, Severity::Information)]
    fn severity_mapping(#[case] from: ExpanderSeverity, #[case] to: Severity) {
        assert_eq!(severity_of(from), to);
    }

    #[test]
    fn offsets_are_copied_unchanged() {
        let diag = ExpanderDiagnostic::new(ExpanderSeverity::Error, "unknown derive").at(4, 9);

        let converted = from_expander(&diag, "utsushi");

        assert_eq!(converted.span, Some(TextSpan::new(4, 5)));
        assert_eq!(converted.source.as_deref(), Some("utsushi"));
        assert_eq!(converted.message, "unknown derive");
    }

    #[test]
    fn missing_offsets_yield_no_span() {
        let diag = ExpanderDiagnostic::new(ExpanderSeverity::Warning, "deprecated");
        assert_eq!(from_expander(&diag, "utsushi").span, None);
    }

    #[test]
    fn start_without_end_is_empty_span() {
        let mut diag = ExpanderDiagnostic::new(ExpanderSeverity::Warning, "here");
        diag.start = Some(12);
        assert_eq!(from_expander(&diag, "utsushi").span, Some(TextSpan::new(12, 0)));
    }
}
