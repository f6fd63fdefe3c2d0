//! Row buffer — loaded file content, one row per line.
//!
//! A [`Row`] is one line of the file with its terminator bytes stripped;
//! a [`RowBuffer`] is the ordered sequence of them, in file order. The
//! buffer is append-only during load and immutable afterward: this layer
//! of the editor views text, it does not change it.
//!
//! # Design choices
//!
//! - **Bytes, not strings.** The viewer treats file content as opaque
//!   bytes: no encoding validation, no width computation. One byte is one
//!   column. A `Vec<u8>` per row is all the structure that needs.
//!
//! - **All trailing terminators stripped.** A line ending in `\r\n` loses
//!   both bytes, and a stray `\r\r\n` loses all three. What remains is
//!   exactly what the renderer may show.
//!
//! - **The last line needs no newline.** A file whose final line is
//!   unterminated still yields that line as a row.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

// ---------------------------------------------------------------------------
// Row
// ---------------------------------------------------------------------------

/// One line of loaded file content, without its line-terminator bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    chars: Vec<u8>,
}

impl Row {
    /// Build a row from a raw line, stripping all trailing `\n`/`\r` bytes.
    #[must_use]
    fn from_line(line: &[u8]) -> Self {
        let mut end = line.len();
        while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
            end -= 1;
        }
        Self {
            chars: line[..end].to_vec(),
        }
    }

    /// The row's content bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.chars
    }

    /// Number of content bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True for a row with no content bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RowBuffer
// ---------------------------------------------------------------------------

/// Ordered sequence of rows: insertion order = file order = screen order.
///
/// Index `i` is valid for `0 <= i < len()`. Rows are appended during load
/// and never mutated afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBuffer {
    rows: Vec<Row>,
}

impl RowBuffer {
    /// Create an empty buffer (viewer started without a file argument).
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Load a buffer from a file.
    ///
    /// Reads line by line; each line, stripped of its trailing `\n`/`\r`
    /// bytes, becomes one row. No line-length limit beyond memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read; the failed
    /// path is named in the message. Callers treat this as fatal.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))?;

        let mut reader = BufReader::new(file);
        let mut buffer = Self::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            buffer.rows.push(Row::from_line(&line));
        }
        Ok(buffer)
    }

    /// Build a buffer from in-memory text, splitting lines the same way
    /// [`open`](Self::open) does.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        for line in text.split_inclusive('\n') {
            buffer.rows.push(Row::from_line(line.as_bytes()));
        }
        buffer
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows are loaded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `index`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Length of the row at `index`, 0 when `index` is past the end.
    ///
    /// The cursor may sit one row past the last real row; treating that
    /// synthetic row as empty is what clamps the cursor column there.
    #[inline]
    #[must_use]
    pub fn row_len(&self, index: usize) -> usize {
        self.rows.get(index).map_or(0, Row::len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn temp_file(name: &str, content: &[u8]) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("vellum-row-{}-{name}", std::process::id()));
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    // -- Row ----------------------------------------------------------------

    #[test]
    fn strips_trailing_lf() {
        assert_eq!(Row::from_line(b"hello\n").as_bytes(), b"hello");
    }

    #[test]
    fn strips_trailing_crlf() {
        assert_eq!(Row::from_line(b"hello\r\n").as_bytes(), b"hello");
    }

    #[test]
    fn strips_all_trailing_terminators() {
        // Not just one terminator pair: every trailing \r and \n goes.
        assert_eq!(Row::from_line(b"hello\r\r\n").as_bytes(), b"hello");
        assert_eq!(Row::from_line(b"hello\n\r\n").as_bytes(), b"hello");
    }

    #[test]
    fn keeps_interior_cr() {
        assert_eq!(Row::from_line(b"a\rb\n").as_bytes(), b"a\rb");
    }

    #[test]
    fn terminator_only_line_is_empty_row() {
        let row = Row::from_line(b"\r\n");
        assert!(row.is_empty());
        assert_eq!(row.len(), 0);
    }

    #[test]
    fn row_length_counts_bytes() {
        assert_eq!(Row::from_line(b"abc\n").len(), 3);
    }

    // -- from_text ------------------------------------------------------------

    #[test]
    fn from_text_splits_lines() {
        let buf = RowBuffer::from_text("abc\n\nde\n");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.get(0).unwrap().as_bytes(), b"abc");
        assert_eq!(buf.get(1).unwrap().as_bytes(), b"");
        assert_eq!(buf.get(2).unwrap().as_bytes(), b"de");
    }

    #[test]
    fn from_text_no_trailing_newline() {
        let buf = RowBuffer::from_text("abc\nde");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(1).unwrap().as_bytes(), b"de");
    }

    #[test]
    fn from_text_trailing_newline_adds_no_phantom_row() {
        assert_eq!(RowBuffer::from_text("abc\n").len(), 1);
    }

    #[test]
    fn from_text_empty_is_empty_buffer() {
        let buf = RowBuffer::from_text("");
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn from_text_crlf_lines() {
        let buf = RowBuffer::from_text("one\r\ntwo\r\n");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(0).unwrap().as_bytes(), b"one");
        assert_eq!(buf.get(1).unwrap().as_bytes(), b"two");
    }

    // -- open -----------------------------------------------------------------

    #[test]
    fn open_reads_lines_in_order() {
        let path = temp_file("ordered", b"first\nsecond\nthird\n");
        let buf = RowBuffer::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.get(0).unwrap().as_bytes(), b"first");
        assert_eq!(buf.get(2).unwrap().as_bytes(), b"third");
    }

    #[test]
    fn open_keeps_unterminated_last_line() {
        let path = temp_file("unterminated", b"one\ntwo");
        let buf = RowBuffer::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(1).unwrap().as_bytes(), b"two");
    }

    #[test]
    fn open_missing_file_names_path() {
        let err = RowBuffer::open(Path::new("/no/such/vellum/file")).unwrap_err();
        assert!(err.to_string().contains("/no/such/vellum/file"));
    }

    #[test]
    fn open_empty_file_is_empty_buffer() {
        let path = temp_file("empty", b"");
        let buf = RowBuffer::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(buf.is_empty());
    }

    // -- row_len --------------------------------------------------------------

    #[test]
    fn row_len_in_bounds() {
        let buf = RowBuffer::from_text("abc\nde\n");
        assert_eq!(buf.row_len(0), 3);
        assert_eq!(buf.row_len(1), 2);
    }

    #[test]
    fn row_len_past_end_is_zero() {
        let buf = RowBuffer::from_text("abc\n");
        assert_eq!(buf.row_len(1), 0);
        assert_eq!(buf.row_len(99), 0);
    }
}
