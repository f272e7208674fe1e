//! Parsing of annotated code snippets.
//!
//! Test markup embeds location markers directly in the snippet:
//!
//! ```text
//! let [|x|] = 1;              anonymous marker around `x`
//! let {|shadowed:y|} = 2;     named marker around `y`
//! ```
//!
//! [`CodeMarkup::parse`] strips all marker delimiters and records, for each
//! marker, the span its content occupies in the *stripped* code. The
//! stripped code is what gets analyzed; marker syntax never reaches the
//! front end.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use rulekit_source_file::{Spanned, TextSpan};

use crate::locator::{Locator, MarkerLocator};

/// Malformed test markup. These indicate a bug in the test itself and are
/// never swallowed. Offsets refer to the original markup text, where the
/// test author can see the problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("marker closed at offset {offset} was never opened")]
    UnbalancedMarker { offset: usize },

    #[error("marker opened at offset {offset} is never closed")]
    UnclosedMarker { offset: usize },

    #[error("marker name at offset {offset} is empty or not followed by `:`")]
    InvalidMarkerName { offset: usize },

    #[error("markup contains no markers")]
    NoMarkers,

    #[error(
        "markup defines more than one marker group ({}); use a named locator instead",
        .names.join(", ")
    )]
    AmbiguousMarkers { names: Vec<String> },

    #[error("markup defines no marker named `{name}`")]
    UnknownMarker { name: String },
}

/// A single annotated point or range in test markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    name: Option<Box<str>>,
    span: TextSpan,
}

impl Marker {
    /// The marker's group name; `None` for anonymous `[|...|]` markers.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Spanned for Marker {
    fn span(&self) -> TextSpan {
        self.span
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "`{name}` at {span}", span = self.span),
            None => write!(f, "{span}", span = self.span),
        }
    }
}

/// The parsed form of an annotated snippet: the stripped code plus every
/// marker recorded against stripped offsets.
///
/// Markers and their spans are fixed at parse time and never recomputed, so
/// locators derived from the same `CodeMarkup` always agree about offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMarkup {
    code: String,
    markers: Vec<Marker>,
}

impl CodeMarkup {
    /// Parses `markup`, stripping marker delimiters and recording marker
    /// spans against the stripped code.
    ///
    /// Markers may nest; content between delimiters is preserved verbatim.
    pub fn parse(markup: &str) -> Result<CodeMarkup, MarkupError> {
        Parser::new(markup).parse()
    }

    /// The snippet with all marker syntax removed.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// All markers in source order.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// The locator for "the" marker of this markup.
    ///
    /// Requires exactly one marker group: either a single marker, or several
    /// markers sharing one name (the group then matches at *any* of its
    /// spans). Fails when the markup has no markers or mixes groups.
    pub fn locator(&self) -> Result<Locator, MarkupError> {
        let mut groups = self.groups();
        match groups.len() {
            0 => Err(MarkupError::NoMarkers),
            1 => {
                let (name, spans) = groups.pop().expect("length checked above");
                Ok(Locator::Marker(MarkerLocator::new(
                    name.map(Box::from),
                    spans,
                )))
            }
            _ => Err(MarkupError::AmbiguousMarkers {
                names: groups
                    .iter()
                    .map(|(name, _)| {
                        name.map_or_else(|| "anonymous".to_string(), |name| format!("`{name}`"))
                    })
                    .collect(),
            }),
        }
    }

    /// The locator for the marker group named `name`.
    pub fn locator_for(&self, name: &str) -> Result<Locator, MarkupError> {
        let spans: SmallVec<[TextSpan; 2]> = self
            .markers
            .iter()
            .filter(|marker| marker.name() == Some(name))
            .map(Spanned::span)
            .collect();

        if spans.is_empty() {
            return Err(MarkupError::UnknownMarker {
                name: name.to_string(),
            });
        }
        Ok(Locator::Marker(MarkerLocator::new(
            Some(Box::from(name)),
            spans,
        )))
    }

    /// One locator per marker occurrence, in source order, for asserting
    /// that a diagnostic appears at *every* annotated point independently.
    pub fn all_locators(&self) -> Vec<Locator> {
        self.markers
            .iter()
            .map(|marker| {
                Locator::Marker(MarkerLocator::new(
                    marker.name.clone(),
                    SmallVec::from_slice(&[marker.span]),
                ))
            })
            .collect()
    }

    /// Markers grouped by name in first-seen order; all anonymous markers
    /// form one group.
    fn groups(&self) -> Vec<(Option<&str>, SmallVec<[TextSpan; 2]>)> {
        let mut groups: Vec<(Option<&str>, SmallVec<[TextSpan; 2]>)> = Vec::new();
        let mut index: FxHashMap<Option<&str>, usize> = FxHashMap::default();

        for marker in &self.markers {
            let key = marker.name();
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push((key, SmallVec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(marker.span());
        }

        groups
    }
}

struct OpenMarker {
    name: Option<Box<str>>,
    /// Offset in the stripped code where the marker's content begins.
    code_start: u32,
    /// Offset of the opening delimiter in the original markup.
    markup_offset: usize,
}

struct Parser<'s> {
    markup: &'s str,
    /// Cursor into `markup`.
    position: usize,
    code: String,
    open: Vec<OpenMarker>,
    markers: Vec<Marker>,
}

impl<'s> Parser<'s> {
    fn new(markup: &'s str) -> Self {
        Self {
            markup,
            position: 0,
            code: String::with_capacity(markup.len()),
            open: Vec::new(),
            markers: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<CodeMarkup, MarkupError> {
        while self.position < self.markup.len() {
            let rest = &self.markup[self.position..];

            if rest.starts_with("[|") {
                self.open_marker(None, 2);
            } else if rest.starts_with("{|") {
                let name = self.scan_marker_name(&rest[2..])?;
                let consumed = 2 + name.len() + 1;
                self.open_marker(Some(name), consumed);
            } else if rest.starts_with("|]") {
                self.close_marker(false)?;
            } else if rest.starts_with("|}") {
                self.close_marker(true)?;
            } else if let Some(ch) = rest.chars().next() {
                self.code.push(ch);
                self.position += ch.len_utf8();
            }
        }

        if let Some(unclosed) = self.open.last() {
            return Err(MarkupError::UnclosedMarker {
                offset: unclosed.markup_offset,
            });
        }

        // Markers are recorded as they close, which lists nested markers
        // inside-out. Restore source order.
        self.markers
            .sort_by_key(|marker| (marker.span.start(), marker.span.end()));

        Ok(CodeMarkup {
            code: self.code,
            markers: self.markers,
        })
    }

    fn scan_marker_name(&self, after_open: &'s str) -> Result<Box<str>, MarkupError> {
        let len = after_open
            .bytes()
            .take_while(|&byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-')
            .count();

        if len == 0 || after_open.as_bytes().get(len) != Some(&b':') {
            return Err(MarkupError::InvalidMarkerName {
                offset: self.position,
            });
        }
        Ok(Box::from(&after_open[..len]))
    }

    fn open_marker(&mut self, name: Option<Box<str>>, delimiter_len: usize) {
        self.open.push(OpenMarker {
            name,
            code_start: self.code.len() as u32,
            markup_offset: self.position,
        });
        self.position += delimiter_len;
    }

    fn close_marker(&mut self, named: bool) -> Result<(), MarkupError> {
        let Some(open) = self.open.pop() else {
            return Err(MarkupError::UnbalancedMarker {
                offset: self.position,
            });
        };
        if open.name.is_some() != named {
            return Err(MarkupError::UnbalancedMarker {
                offset: self.position,
            });
        }

        self.markers.push(Marker {
            name: open.name,
            span: TextSpan::new(open.code_start, self.code.len() as u32),
        });
        self.position += 2;
        Ok(())
    }
}
