use std::fmt;

/// A one-line position within a [`Source`](super::Source): enough to
/// build a diagnostic like `line 4, column 9`, but no caret rendering
/// and no byte offsets into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, length: u32) -> Span {
        Span {
            line,
            column,
            length,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Wraps a value with the span it was parsed from. Every [`Token`](crate::token::Token)
/// and AST node carries one of these so the evaluator can point at a
/// precise location when something goes wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(item: T, span: Span) -> Spanned<T> {
        Spanned { item, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            item: f(self.item),
            span: self.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reads_as_line_column() {
        let span = Span::new(4, 9, 1);
        assert_eq!(span.to_string(), "line 4, column 9");
    }

    #[test]
    fn map_preserves_span() {
        let spanned = Spanned::new(1, Span::new(2, 3, 1));
        let mapped = spanned.map(|n| n + 1);
        assert_eq!(mapped.item, 2);
        assert_eq!(mapped.span, Span::new(2, 3, 1));
    }
}
