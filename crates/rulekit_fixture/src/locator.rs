//! Location predicates for diagnostics.
//!
//! A [`Locator`] answers one question: does a diagnostic's reported span
//! satisfy this location? The three ways of describing a location — a
//! 1-based line, an explicit character span, a marker recorded by
//! [`CodeMarkup`](crate::CodeMarkup) — are interchangeable wherever the
//! assertion engine accepts a locator. Locators are stateless values; they
//! hold precomputed offsets and perform no I/O when matching.

use std::fmt;

use smallvec::SmallVec;

use rulekit_source_file::{LineIndex, OneIndexed, TextSpan};

/// Invalid location description in a test, e.g. a line number a snippet
/// does not have. A bug in the test itself; fails fast.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("line {line} is out of range for a snippet with {line_count} line(s)")]
    LineOutOfRange { line: usize, line_count: usize },
}

/// A predicate matching a diagnostic's reported location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Line(LineLocator),
    Span(TextSpanLocator),
    Marker(MarkerLocator),
}

impl Locator {
    /// A locator for the 1-based line `line_number` of `code`.
    pub fn line(code: &str, line_number: usize) -> Result<Self, LocatorError> {
        LineLocator::from_code(code, line_number).map(Self::Line)
    }

    /// A locator matching within `span`.
    pub fn span(span: TextSpan) -> Self {
        Self::Span(TextSpanLocator::new(span))
    }

    /// Returns `true` if a diagnostic reported at `span` satisfies this
    /// location.
    pub fn matches(&self, span: TextSpan) -> bool {
        match self {
            Locator::Line(locator) => locator.matches(span),
            Locator::Span(locator) => locator.matches(span),
            Locator::Marker(locator) => locator.matches(span),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Line(locator) => fmt::Display::fmt(locator, f),
            Locator::Span(locator) => fmt::Display::fmt(locator, f),
            Locator::Marker(locator) => fmt::Display::fmt(locator, f),
        }
    }
}

impl From<LineLocator> for Locator {
    fn from(locator: LineLocator) -> Self {
        Self::Line(locator)
    }
}

impl From<TextSpanLocator> for Locator {
    fn from(locator: TextSpanLocator) -> Self {
        Self::Span(locator)
    }
}

impl From<MarkerLocator> for Locator {
    fn from(locator: MarkerLocator) -> Self {
        Self::Marker(locator)
    }
}

/// Matches any diagnostic whose location starts on a given 1-based line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLocator {
    line: OneIndexed,
    /// Full character range of the line, terminator included.
    span: TextSpan,
    /// The line closes the input; an end-of-input diagnostic still lands
    /// on it.
    is_last: bool,
}

impl LineLocator {
    /// Computes the character range of the 1-based line `line_number` by
    /// scanning `code` for line terminators.
    pub fn from_code(code: &str, line_number: usize) -> Result<Self, LocatorError> {
        let index = LineIndex::from_source_text(code);
        Self::from_index(&index, line_number, code)
    }

    /// Same as [`from_code`](Self::from_code), for callers who already hold
    /// a [`LineIndex`] for `code`.
    pub fn from_index(
        index: &LineIndex,
        line_number: usize,
        code: &str,
    ) -> Result<Self, LocatorError> {
        let out_of_range = || LocatorError::LineOutOfRange {
            line: line_number,
            line_count: index.line_count(),
        };

        let line = OneIndexed::new(line_number).ok_or_else(out_of_range)?;
        let span = index.full_line_span(line, code).ok_or_else(out_of_range)?;

        Ok(Self {
            line,
            span,
            is_last: line.get() == index.line_count(),
        })
    }

    pub fn line(&self) -> OneIndexed {
        self.line
    }

    pub fn matches(&self, span: TextSpan) -> bool {
        let start = span.start();
        self.span.contains(start) || (self.is_last && start == self.span.end())
    }
}

impl fmt::Display for LineLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {line}", line = self.line)
    }
}

/// Matches a diagnostic whose location falls within a given span.
///
/// Containment rather than equality: analyzers are allowed to report a
/// squiggle wider than, or narrower than, the exact marked token, as long
/// as it stays inside the expected span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpanLocator {
    span: TextSpan,
}

impl TextSpanLocator {
    pub fn new(span: TextSpan) -> Self {
        Self { span }
    }

    pub fn span(&self) -> TextSpan {
        self.span
    }

    pub fn matches(&self, span: TextSpan) -> bool {
        self.span.contains_span(span)
    }
}

impl fmt::Display for TextSpanLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "span {span}", span = self.span)
    }
}

/// Matches within any span recorded for one marker group.
///
/// Produced by [`CodeMarkup`](crate::CodeMarkup); remembers the group name
/// so failure reports can say which marker was searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerLocator {
    name: Option<Box<str>>,
    spans: SmallVec<[TextSpan; 2]>,
}

impl MarkerLocator {
    pub(crate) fn new(name: Option<Box<str>>, spans: SmallVec<[TextSpan; 2]>) -> Self {
        Self { name, spans }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    pub fn matches(&self, span: TextSpan) -> bool {
        self.spans.iter().any(|marked| marked.contains_span(span))
    }
}

impl fmt::Display for MarkerLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "marker `{name}` at ")?,
            None => write!(f, "marker at ")?,
        }
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{span}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rulekit_source_file::TextSpan;
    use smallvec::SmallVec;

    use crate::locator::{LineLocator, Locator, LocatorError, MarkerLocator, TextSpanLocator};

    #[test]
    fn line_locator_matches_exactly_its_line() {
        let code = "ab\ncd\nef";

        // Line 1 covers offsets 0..3 (terminator included).
        let line1 = LineLocator::from_code(code, 1).unwrap();
        for start in 0..3 {
            assert!(line1.matches(TextSpan::empty(start)), "offset {start}");
        }
        assert!(!line1.matches(TextSpan::empty(3)));

        let line2 = LineLocator::from_code(code, 2).unwrap();
        assert!(!line2.matches(TextSpan::empty(2)));
        assert!(line2.matches(TextSpan::new(3, 5)));
        assert!(!line2.matches(TextSpan::empty(6)));

        // The last line reaches the end of input, inclusively.
        let line3 = LineLocator::from_code(code, 3).unwrap();
        assert!(line3.matches(TextSpan::new(6, 8)));
        assert!(line3.matches(TextSpan::empty(8)));
    }

    #[test]
    fn line_locator_matches_by_start_only() {
        let code = "ab\ncd\n";
        let line1 = LineLocator::from_code(code, 1).unwrap();

        // A squiggle spilling into the next line still starts on line 1.
        assert!(line1.matches(TextSpan::new(1, 5)));
    }

    #[test]
    fn line_locator_out_of_range() {
        let code = "ab\ncd";
        assert_eq!(
            LineLocator::from_code(code, 0),
            Err(LocatorError::LineOutOfRange {
                line: 0,
                line_count: 2
            })
        );
        assert_eq!(
            LineLocator::from_code(code, 3),
            Err(LocatorError::LineOutOfRange {
                line: 3,
                line_count: 2
            })
        );
    }

    #[test]
    fn span_locator_matches_by_containment() {
        let locator = TextSpanLocator::new(TextSpan::new(4, 10));
        assert!(locator.matches(TextSpan::new(4, 10)));
        assert!(locator.matches(TextSpan::new(5, 9)));
        assert!(locator.matches(TextSpan::empty(10)));
        assert!(!locator.matches(TextSpan::new(3, 10)));
        assert!(!locator.matches(TextSpan::new(4, 11)));
    }

    #[test]
    fn marker_locator_matches_any_of_its_spans() {
        let locator = MarkerLocator::new(
            Some(Box::from("dup")),
            SmallVec::from_slice(&[TextSpan::new(0, 2), TextSpan::new(8, 10)]),
        );
        assert!(locator.matches(TextSpan::new(0, 2)));
        assert!(locator.matches(TextSpan::new(8, 9)));
        assert!(!locator.matches(TextSpan::new(4, 6)));
    }

    #[test]
    fn display() {
        let line = Locator::line("ab\ncd", 2).unwrap();
        assert_eq!(line.to_string(), "line 2");

        let span = Locator::span(TextSpan::new(4, 10));
        assert_eq!(span.to_string(), "span 4..10");

        let marker = Locator::Marker(MarkerLocator::new(
            Some(Box::from("dup")),
            SmallVec::from_slice(&[TextSpan::new(0, 2), TextSpan::new(8, 10)]),
        ));
        assert_eq!(marker.to_string(), "marker `dup` at 0..2, 8..10");

        let anonymous = Locator::Marker(MarkerLocator::new(
            None,
            SmallVec::from_slice(&[TextSpan::new(1, 2)]),
        ));
        assert_eq!(anonymous.to_string(), "marker at 1..2");
    }
}
