use memchr::memchr_iter;

use crate::{LineColumn, OneIndexed, TextSpan};

/// Precomputed byte offsets of every line start in a source snippet.
///
/// Built once per snippet; all queries are `O(log n)` or better. `\r\n`
/// terminators are handled by construction since the line starts after the
/// `\n` either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn from_source_text(text: &str) -> Self {
        assert!(
            u32::try_from(text.len()).is_ok(),
            "snippet longer than 4 GiB"
        );

        let mut line_starts = Vec::with_capacity(text.len() / 40 + 1);
        line_starts.push(0);
        for newline in memchr_iter(b'\n', text.as_bytes()) {
            line_starts.push(newline as u32 + 1);
        }

        Self { line_starts }
    }

    /// The number of lines, counting a trailing empty line after a final
    /// terminator (`"a\n"` has two lines, the second empty).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The line on which `offset` falls.
    ///
    /// Offsets past the end of the text map to the last line.
    pub fn line_index(&self, offset: u32) -> OneIndexed {
        let next = self.line_starts.partition_point(|&start| start <= offset);
        // `line_starts` always begins with 0, so `next >= 1`.
        OneIndexed::from_zero_indexed(next - 1)
    }

    /// Byte offset of the first character of `line`, or `None` if the line
    /// does not exist.
    pub fn line_start(&self, line: OneIndexed) -> Option<u32> {
        self.line_starts.get(line.to_zero_indexed()).copied()
    }

    /// The span of `line` excluding its terminator.
    pub fn line_span(&self, line: OneIndexed, text: &str) -> Option<TextSpan> {
        let start = self.line_start(line)?;
        let end = match self.line_starts.get(line.get()) {
            Some(&next) => {
                let mut end = next - 1;
                if end > start && text.as_bytes()[end as usize - 1] == b'\r' {
                    end -= 1;
                }
                end
            }
            None => text.len() as u32,
        };
        Some(TextSpan::new(start, end))
    }

    /// The span of `line` including its terminator; the last line runs to
    /// the end of `text`.
    pub fn full_line_span(&self, line: OneIndexed, text: &str) -> Option<TextSpan> {
        let start = self.line_start(line)?;
        let end = self
            .line_starts
            .get(line.get())
            .copied()
            .unwrap_or(text.len() as u32);
        Some(TextSpan::new(start, end))
    }

    /// One-based line and character column of `offset`.
    ///
    /// Columns count characters, not bytes, so multi-byte characters advance
    /// the column by one. Offsets outside `text` fall back to column 1.
    pub fn line_column(&self, offset: u32, text: &str) -> LineColumn {
        let line = self.line_index(offset);
        let start = self.line_starts[line.to_zero_indexed()];
        let column = text
            .get(start as usize..offset as usize)
            .map_or(0, |prefix| prefix.chars().count());

        LineColumn {
            line,
            column: OneIndexed::from_zero_indexed(column),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{LineIndex, OneIndexed, TextSpan};

    fn line(number: usize) -> OneIndexed {
        OneIndexed::new(number).unwrap()
    }

    #[test]
    fn empty_text() {
        let index = LineIndex::from_source_text("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_span(line(1), ""), Some(TextSpan::empty(0)));
        assert_eq!(index.line_index(0), line(1));
    }

    #[test]
    fn line_starts() {
        let text = "ab\ncd\nef";
        let index = LineIndex::from_source_text(text);
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_start(line(1)), Some(0));
        assert_eq!(index.line_start(line(2)), Some(3));
        assert_eq!(index.line_start(line(3)), Some(6));
        assert_eq!(index.line_start(line(4)), None);
    }

    #[test]
    fn line_index_maps_offsets() {
        let text = "ab\ncd\n";
        let index = LineIndex::from_source_text(text);
        assert_eq!(index.line_index(0), line(1));
        assert_eq!(index.line_index(2), line(1));
        assert_eq!(index.line_index(3), line(2));
        assert_eq!(index.line_index(5), line(2));
        // Offset at the trailing empty line.
        assert_eq!(index.line_index(6), line(3));
    }

    #[test]
    fn spans_exclude_and_include_terminators() {
        let text = "ab\ncd\nef";
        let index = LineIndex::from_source_text(text);
        assert_eq!(index.line_span(line(1), text), Some(TextSpan::new(0, 2)));
        assert_eq!(
            index.full_line_span(line(1), text),
            Some(TextSpan::new(0, 3))
        );
        // The last line has no terminator.
        assert_eq!(index.line_span(line(3), text), Some(TextSpan::new(6, 8)));
        assert_eq!(
            index.full_line_span(line(3), text),
            Some(TextSpan::new(6, 8))
        );
    }

    #[test]
    fn crlf_terminators() {
        let text = "ab\r\ncd";
        let index = LineIndex::from_source_text(text);
        assert_eq!(index.line_span(line(1), text), Some(TextSpan::new(0, 2)));
        assert_eq!(
            index.full_line_span(line(1), text),
            Some(TextSpan::new(0, 4))
        );
        assert_eq!(index.line_span(line(2), text), Some(TextSpan::new(4, 6)));
    }

    #[test]
    fn line_column_counts_characters() {
        let text = "ab\ncåd";
        let index = LineIndex::from_source_text(text);

        let position = index.line_column(0, text);
        assert_eq!((position.line.get(), position.column.get()), (1, 1));

        // `å` is two bytes; the `d` behind it is still column 3.
        let position = index.line_column(6, text);
        assert_eq!((position.line.get(), position.column.get()), (2, 3));
        assert_eq!(position.to_string(), "2:3");
    }
}
