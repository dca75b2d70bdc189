//! Renders a compile failure against the source it came from.
//!
//! Compilation stops at the first error, so a report covers exactly one
//! span.  Line and column are derived from the span when the report is
//! printed; tokens and errors only carry byte offsets.

use crate::Span;

pub struct Report<'a> {
    source: &'a str,
    path: String,
}

impl<'a> Report<'a> {
    pub fn new(source: &'a str, path: String) -> Self {
        Self { source, path }
    }

    /// Prints `path:line:column: ERROR: message`, the offending source line
    /// and a caret run covering the span.
    pub fn print<W: std::io::Write>(
        &self,
        output: &mut W,
        span: &Span,
        message: &str,
    ) -> Result<(), std::io::Error> {
        let line_start = if let Some(found) = self.source[..span.start].rfind('\n') {
            found + 1
        } else {
            0
        };

        let line_end = if let Some(found) = self.source[span.start..].find('\n') {
            span.start + found
        } else {
            self.source.len()
        };

        let fragment = &self.source[line_start..line_end];

        let line = self.source[..span.start].matches('\n').count() + 1;
        let column = span.start - line_start;

        writeln!(
            output,
            "{}:{}:{}: ERROR: {}",
            self.path,
            line,
            column + 1,
            message
        )?;

        writeln!(output, "{}", fragment)?;
        for _ in 0..column {
            write!(output, " ")?;
        }
        // An empty span still gets one caret.
        let end = if span.start == span.end {
            span.end + 1
        } else {
            span.end
        };
        for _ in span.start..end {
            write!(output, "^")?;
        }
        writeln!(output)
    }
}
