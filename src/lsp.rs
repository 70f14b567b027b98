//! Conversion of crate results to LSP shapes.
//!
//! Offsets in this crate are UTF-8 byte offsets; LSP positions count UTF-16
//! code units per line. [`LineMap`] translates between the two.

use std::str::FromStr;

use line_index::{LineCol, LineIndex, TextSize, WideEncoding, WideLineCol};
use tower_lsp_server::ls_types::{self, DiagnosticSeverity, NumberOrString, Position, Range, Uri};
use url::Url;

use crate::host::{Diagnostic, Severity};
use crate::mapping::TextSpan;

/// Byte offset ↔ LSP position translation for one text.
pub struct LineMap<'a> {
    text: &'a str,
    index: LineIndex,
}

impl<'a> LineMap<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            index: LineIndex::new(text),
        }
    }

    /// Convert a byte offset to an LSP position.
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a
    /// multi-byte character snap to its start.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line_col = self.index.line_col(text_size(offset));
        let character = self
            .index
            .to_wide(WideEncoding::Utf16, line_col)
            .map_or(line_col.col, |wide| wide.col);
        Position {
            line: line_col.line,
            character,
        }
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// A character past the end of its line clamps to the line end; a line
    /// past the end of the text clamps to the end of the text.
    pub fn position_to_offset(&self, position: Position) -> usize {
        let wide = WideLineCol {
            line: position.line,
            col: position.character,
        };
        let Some(offset) = self
            .index
            .to_utf8(WideEncoding::Utf16, wide)
            .and_then(|line_col| self.index.offset(line_col))
        else {
            return self.text.len();
        };
        usize::from(offset).min(self.line_end(position.line))
    }

    pub fn span_to_range(&self, span: TextSpan) -> Range {
        Range {
            start: self.offset_to_position(span.start),
            end: self.offset_to_position(span.end()),
        }
    }

    pub fn range_to_span(&self, range: Range) -> TextSpan {
        TextSpan::from_bounds(
            self.position_to_offset(range.start),
            self.position_to_offset(range.end),
        )
    }

    /// Byte offset of the end of `line`, excluding its line break.
    fn line_end(&self, line: u32) -> usize {
        let next = self.index.offset(LineCol {
            line: line + 1,
            col: 0,
        });
        match next {
            Some(next) => {
                let end = usize::from(next).saturating_sub(1);
                if end > 0 && self.text.as_bytes().get(end - 1) == Some(&b'\r') {
                    end - 1
                } else {
                    end
                }
            }
            None => self.text.len(),
        }
    }
}

fn text_size(offset: usize) -> TextSize {
    TextSize::from(u32::try_from(offset).unwrap_or(u32::MAX))
}

pub fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Convert a diagnostic in `text` to its LSP form. Diagnostics without a
/// span are placed at the start of the file.
pub fn to_lsp_diagnostic(diagnostic: &Diagnostic, lines: &LineMap<'_>) -> ls_types::Diagnostic {
    let range = diagnostic
        .span
        .map(|span| lines.span_to_range(span))
        .unwrap_or_default();
    ls_types::Diagnostic {
        range,
        severity: Some(to_lsp_severity(diagnostic.severity)),
        code: diagnostic.code.clone().map(NumberOrString::String),
        source: diagnostic.source.clone(),
        message: diagnostic.message.clone(),
        ..Default::default()
    }
}

pub fn url_to_uri(url: &Url) -> Option<Uri> {
    Uri::from_str(url.as_str()).ok()
}
