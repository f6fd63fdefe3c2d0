// SPDX-License-Identifier: MIT
//
// vellum — a minimal terminal text viewer.
//
// This is the main binary that wires together the member crates:
//
//   vellum-term → raw mode, window geometry, ANSI output, key decoding
//   vellum-view → row buffer, view state, renderer
//
// Each keypress flows through:
//
//   stdin → read_key → process_key → view state mutation
//   refresh → render_frame → OutputBuffer → one write to the terminal
//
// The loop alternates strictly: a frame always reflects the most recently
// applied key before the next key is read. One thread, no channels, no
// timers; the 0.1 s read timeout in raw mode is the only thing that ever
// wakes the process without input.

use std::env;
use std::io;
use std::path::Path;
use std::process::ExitCode;

use vellum_term::input::{self, Key, ctrl};
use vellum_term::output::OutputBuffer;
use vellum_term::terminal::{self, RawSession, Size, TtyReader};

use vellum_view::render;
use vellum_view::row::RowBuffer;
use vellum_view::view::ViewState;

// ─── Key dispatch ───────────────────────────────────────────────────────────

/// The quit chord: CTRL-q.
const QUIT: u8 = ctrl(b'q');

/// What the viewer tells the main loop after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
}

// ─── Viewer ─────────────────────────────────────────────────────────────────

/// The viewer: loaded rows, cursor/scroll state, and the frame buffer.
///
/// An explicit state object constructed at startup and passed by reference,
/// so every mutation site is visible in a signature somewhere.
struct Viewer {
    rows: RowBuffer,
    view: ViewState,
    frame: OutputBuffer,
}

impl Viewer {
    fn new(rows: RowBuffer, size: Size) -> Self {
        Self {
            rows,
            view: ViewState::new(usize::from(size.rows), usize::from(size.cols)),
            frame: OutputBuffer::new(),
        }
    }

    /// Redraw the whole screen from the current state.
    fn refresh(&mut self) -> io::Result<()> {
        render::refresh(&mut self.frame, &self.rows, &mut self.view)
    }

    /// Apply one decoded key.
    fn process_key(&mut self, key: Key) -> Action {
        match key {
            Key::Byte(QUIT) => return Action::Quit,
            Key::Home => self.view.home(),
            Key::End => self.view.end_key(),
            Key::PageUp | Key::PageDown => self.view.page(key, &self.rows),
            Key::Up | Key::Down | Key::Left | Key::Right => {
                self.view.move_cursor(key, &self.rows);
            }
            // Everything else is reserved for the editing layers to come.
            Key::Byte(_) | Key::Escape | Key::Delete => {}
        }
        Action::Continue
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn run() -> io::Result<()> {
    // Raw mode first: the window-size fallback probe needs it to read the
    // DSR reply byte-by-byte. The session restores the terminal on every
    // exit path out of this function, error returns included.
    let _session = RawSession::enter()?;
    let size = terminal::window_size()?;

    let rows = match env::args().nth(1) {
        Some(path) => RowBuffer::open(Path::new(&path))?,
        None => RowBuffer::new(),
    };

    let mut viewer = Viewer::new(rows, size);
    let mut tty = TtyReader::new();

    loop {
        viewer.refresh()?;
        let key = input::read_key(&mut tty)?;
        if viewer.process_key(key) == Action::Quit {
            return Ok(());
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // By the time run() returns, the session drop has already
            // cleared the screen and restored the terminal, so the message
            // lands on a usable prompt.
            eprintln!("vellum: {e}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
