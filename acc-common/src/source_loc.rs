//! Source location tracking for error reporting
//!
//! This module provides types for tracking locations in the source text,
//! which is essential for good error messages. Locations carry a byte
//! offset in addition to line and column so a caret can be drawn beneath
//! the exact offending character.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in the source text (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The location of the first character of the input
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span in the source text (from start to end location)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Create a span from a single location
    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}", self.start)
            } else {
                write!(f, "{}-{}", self.start, self.end.column)
            }
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Render the offending source line with a caret beneath the given column.
///
/// Used by the driver to turn a fatal diagnostic into the classic
/// two-line snippet:
///
/// ```text
/// a = 3 @ 4;
///       ^
/// ```
pub fn render_snippet(source: &str, location: &SourceLocation) -> String {
    let line_index = location.line.saturating_sub(1) as usize;
    let line = source.lines().nth(line_index).unwrap_or("");
    let caret_column = location.column.saturating_sub(1) as usize;
    format!("{}\n{}^", line, " ".repeat(caret_column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation::new(42, 10, 120);
        assert_eq!(loc.line, 42);
        assert_eq!(loc.column, 10);
        assert_eq!(loc.offset, 120);
        assert_eq!(format!("{}", loc), "42:10");
    }

    #[test]
    fn test_source_span_same_line() {
        let start = SourceLocation::new(1, 5, 4);
        let end = SourceLocation::new(1, 10, 9);
        let span = SourceSpan::new(start, end);

        assert_eq!(format!("{}", span), "1:5-10");
    }

    #[test]
    fn test_source_span_from_location() {
        let span = SourceSpan::from_location(SourceLocation::new(2, 3, 12));
        assert_eq!(span.start, span.end);
        assert_eq!(format!("{}", span), "2:3");
    }

    #[test]
    fn test_render_snippet_points_at_column() {
        let source = "a = 3 @ 4;";
        let snippet = render_snippet(source, &SourceLocation::new(1, 7, 6));
        assert_eq!(snippet, "a = 3 @ 4;\n      ^");
    }

    #[test]
    fn test_render_snippet_second_line() {
        let source = "main() {\n  return @;\n}";
        let snippet = render_snippet(source, &SourceLocation::new(2, 10, 18));
        assert_eq!(snippet, "  return @;\n         ^");
    }

    #[test]
    fn test_render_snippet_out_of_range_line() {
        let snippet = render_snippet("x", &SourceLocation::new(9, 1, 0));
        assert_eq!(snippet, "\n^");
    }
}
