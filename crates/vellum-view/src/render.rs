//! Renderer — projects the row buffer and view state into one ANSI frame.
//!
//! Full redraw, every frame, no diffing against the previous one: at this
//! scale a frame is a few kilobytes and the single buffered write keeps it
//! atomic on screen. The renderer holds no state of its own; it reads the
//! buffer and the view, recomputes the scroll offset, and emits bytes.
//!
//! Frame shape:
//!
//! ```text
//! hide cursor                      \x1b[?25l
//! cursor home                      \x1b[H
//! screenrows of content, each      <row bytes>\x1b[K\r\n   (no \r\n on last)
//! park cursor at view position     \x1b[<y>;<x>H
//! show cursor                      \x1b[?25h
//! ```
//!
//! Rows past the end of the buffer render as a lone `~`, like a certain
//! well-known editor's empty lines. An empty buffer gets a centered
//! welcome banner a third of the way down instead.

use std::io::{self, Write};

use vellum_term::ansi;
use vellum_term::output::OutputBuffer;

use crate::row::RowBuffer;
use crate::view::ViewState;

/// Version string shown in the welcome banner.
const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Emit the centered welcome banner, truncated to the viewport width.
///
/// Centering puts `(screencols - banner) / 2` columns before the text; the
/// first of them is the `~` every empty line carries, the rest are spaces.
/// When the banner fills the whole width there is no room for either.
fn draw_welcome(out: &mut impl Write, screencols: usize) -> io::Result<()> {
    let mut welcome = format!("vellum editor -- version {VERSION}");
    welcome.truncate(screencols);

    let mut padding = (screencols - welcome.len()) / 2;
    if padding > 0 {
        out.write_all(b"~")?;
        padding -= 1;
    }
    for _ in 0..padding {
        out.write_all(b" ")?;
    }
    out.write_all(welcome.as_bytes())
}

/// Emit the viewport's rows: visible buffer content, tildes past the end.
///
/// Each row is followed by erase-to-end-of-line, so the redraw never needs
/// a full-screen clear; stale content to the right of the new content is
/// blanked row by row. A `\r\n` separates rows (OPOST is off in raw mode,
/// so `\n` alone would not return the carriage).
pub fn draw_rows(out: &mut impl Write, rows: &RowBuffer, view: &ViewState) -> io::Result<()> {
    for i in 0..view.screenrows {
        let filerow = i + view.rowoff;

        if let Some(row) = rows.get(filerow) {
            // Visible slice: skip coloff columns, show at most screencols.
            // Scrolled past the row's end leaves an empty (erased) line.
            let bytes = row.as_bytes();
            let start = view.coloff.min(bytes.len());
            let len = bytes.len().saturating_sub(view.coloff).min(view.screencols);
            out.write_all(&bytes[start..start + len])?;
        } else if rows.is_empty() && i == view.screenrows / 3 {
            draw_welcome(out, view.screencols)?;
        } else {
            out.write_all(b"~")?;
        }

        ansi::erase_line(out)?;
        if i + 1 < view.screenrows {
            out.write_all(b"\r\n")?;
        }
    }
    Ok(())
}

/// Produce one complete frame into `out`.
///
/// Recomputes the vertical scroll offset first, so the frame always shows
/// the cursor; then hides the cursor for the duration of the redraw to
/// avoid flicker, draws, parks the cursor at its view position, and shows
/// it again. Pure projection otherwise: same buffer + same view state,
/// same bytes.
///
/// # Errors
///
/// Propagates write errors from `out` (never fails into an in-memory
/// buffer).
pub fn render_frame(
    out: &mut impl Write,
    rows: &RowBuffer,
    view: &mut ViewState,
) -> io::Result<()> {
    view.scroll();

    ansi::cursor_hide(out)?;
    ansi::cursor_home(out)?;

    draw_rows(out, rows, view)?;

    // Clamp to the terminal's addressable range; positions this large are
    // already unreachable on real terminals.
    let x = u16::try_from(view.cx - view.coloff).unwrap_or(u16::MAX);
    let y = u16::try_from(view.cy - view.rowoff).unwrap_or(u16::MAX);
    ansi::cursor_to(out, x, y)?;

    ansi::cursor_show(out)
}

/// Render a frame into `buf` and flush it to the terminal in one write.
///
/// # Errors
///
/// Returns an error if the final write to stdout fails.
pub fn refresh(buf: &mut OutputBuffer, rows: &RowBuffer, view: &mut ViewState) -> io::Result<()> {
    render_frame(buf, rows, view)?;
    buf.flush_stdout()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Render only the row section and split it into per-row strings,
    /// stripping the erase-in-line each row carries.
    fn drawn_rows(rows: &RowBuffer, view: &ViewState) -> Vec<String> {
        let mut out = Vec::new();
        draw_rows(&mut out, rows, view).unwrap();
        String::from_utf8(out)
            .unwrap()
            .split("\r\n")
            .map(|r| {
                r.strip_suffix("\x1b[K")
                    .unwrap_or_else(|| panic!("row missing erase-line: {r:?}"))
                    .to_string()
            })
            .collect()
    }

    fn frame(rows: &RowBuffer, view: &mut ViewState) -> String {
        let mut out = Vec::new();
        render_frame(&mut out, rows, view).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn banner() -> String {
        format!("vellum editor -- version {VERSION}")
    }

    // -- Row section --------------------------------------------------------

    #[test]
    fn emits_one_line_per_viewport_row() {
        let rows = RowBuffer::from_text("a\nb\n");
        let view = ViewState::new(5, 40);
        assert_eq!(drawn_rows(&rows, &view).len(), 5);
    }

    #[test]
    fn buffer_rows_then_tildes() {
        let rows = RowBuffer::from_text("abc\nde\n");
        let view = ViewState::new(4, 40);
        assert_eq!(drawn_rows(&rows, &view), vec!["abc", "de", "~", "~"]);
    }

    #[test]
    fn non_empty_buffer_never_shows_banner() {
        let rows = RowBuffer::from_text("only\n");
        let view = ViewState::new(9, 40);
        let drawn = drawn_rows(&rows, &view);
        // Row 3 (screenrows / 3) is a plain tilde, not the banner.
        assert_eq!(drawn[3], "~");
    }

    #[test]
    fn long_row_truncated_to_viewport_width() {
        let rows = RowBuffer::from_text("0123456789\n");
        let view = ViewState::new(2, 4);
        assert_eq!(drawn_rows(&rows, &view)[0], "0123");
    }

    #[test]
    fn coloff_slices_row_content() {
        let rows = RowBuffer::from_text("0123456789\n");
        let mut view = ViewState::new(2, 4);
        view.coloff = 3;
        assert_eq!(drawn_rows(&rows, &view)[0], "3456");
    }

    #[test]
    fn coloff_past_row_end_draws_empty_line() {
        let rows = RowBuffer::from_text("abc\n");
        let mut view = ViewState::new(2, 40);
        view.coloff = 10;
        assert_eq!(drawn_rows(&rows, &view)[0], "");
    }

    #[test]
    fn rowoff_selects_visible_slice() {
        let rows = RowBuffer::from_text("r0\nr1\nr2\nr3\nr4\n");
        let mut view = ViewState::new(2, 40);
        view.rowoff = 2;
        assert_eq!(drawn_rows(&rows, &view), vec!["r2", "r3"]);
    }

    #[test]
    fn no_line_break_after_last_row() {
        let rows = RowBuffer::new();
        let view = ViewState::new(3, 40);
        let mut out = Vec::new();
        draw_rows(&mut out, &rows, &view).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.ends_with("\r\n"));
        assert_eq!(text.matches("\r\n").count(), 2, "screenrows - 1 breaks");
    }

    // -- Welcome banner -----------------------------------------------------

    #[test]
    fn empty_buffer_shows_banner_a_third_down() {
        let rows = RowBuffer::new();
        let view = ViewState::new(9, 60);
        let drawn = drawn_rows(&rows, &view);

        assert!(drawn[3].contains("vellum editor"), "row 3: {:?}", drawn[3]);
        for (i, row) in drawn.iter().enumerate() {
            if i != 3 {
                assert_eq!(row, "~", "row {i}");
            }
        }
    }

    #[test]
    fn banner_is_centered_with_leading_tilde() {
        let rows = RowBuffer::new();
        let view = ViewState::new(9, 40);
        let row = &drawn_rows(&rows, &view)[3];

        let text = banner(); // 30 chars at version 0.1.0
        let padding = (40 - text.len()) / 2;
        let expected = format!("~{}{}", " ".repeat(padding - 1), text);
        assert_eq!(row, &expected);
        assert!(row.len() <= 40);
    }

    #[test]
    fn banner_truncated_to_exactly_viewport_width() {
        let rows = RowBuffer::new();
        let view = ViewState::new(9, 10);
        let row = &drawn_rows(&rows, &view)[3];

        assert_eq!(row.len(), 10, "no room to center, exact-width truncation");
        assert_eq!(row, &banner()[..10]);
    }

    #[test]
    fn banner_with_zero_padding_has_no_tilde() {
        let rows = RowBuffer::new();
        let text_len = banner().len();
        // One column wider than the text: padding is 0 after floor division.
        let view = ViewState::new(9, text_len + 1);
        let row = &drawn_rows(&rows, &view)[3];
        assert_eq!(row, &banner());
    }

    // -- Full frame ---------------------------------------------------------

    #[test]
    fn frame_hides_cursor_then_homes() {
        let rows = RowBuffer::from_text("x\n");
        let mut view = ViewState::new(2, 10);
        let f = frame(&rows, &mut view);
        assert!(f.starts_with("\x1b[?25l\x1b[H"));
    }

    #[test]
    fn frame_parks_cursor_then_shows_it() {
        let rows = RowBuffer::from_text("abc\ndef\n");
        let mut view = ViewState::new(5, 10);
        view.cx = 2;
        view.cy = 1;
        let f = frame(&rows, &mut view);
        // 1-indexed terminal coordinates: row 2, column 3.
        assert!(f.ends_with("\x1b[2;3H\x1b[?25h"), "frame end: {:?}", &f[f.len() - 16..]);
    }

    #[test]
    fn frame_scrolls_to_keep_cursor_visible() {
        let rows = RowBuffer::from_text(&"r\n".repeat(20));
        let mut view = ViewState::new(3, 10);
        view.cy = 7;

        let f = frame(&rows, &mut view);

        assert_eq!(view.rowoff, 5, "cy - screenrows + 1");
        // The parked cursor is on the last viewport row.
        assert!(f.ends_with("\x1b[3;1H\x1b[?25h"));
    }

    #[test]
    fn frame_is_deterministic() {
        let rows = RowBuffer::from_text("same\n");
        let mut a = ViewState::new(4, 20);
        let mut b = ViewState::new(4, 20);
        assert_eq!(frame(&rows, &mut a), frame(&rows, &mut b));
    }

    #[test]
    fn refresh_via_output_buffer_accumulates_frame() {
        let rows = RowBuffer::from_text("abc\n");
        let mut view = ViewState::new(2, 10);

        let mut buf = OutputBuffer::new();
        render_frame(&mut buf, &rows, &mut view).unwrap();

        let mut direct = Vec::new();
        let mut view2 = ViewState::new(2, 10);
        render_frame(&mut direct, &rows, &mut view2).unwrap();

        assert_eq!(buf.as_bytes(), &direct[..]);
    }
}
