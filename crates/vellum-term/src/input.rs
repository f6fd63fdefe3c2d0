// SPDX-License-Identifier: MIT
//
// Terminal key decoder.
//
// Turns the raw stdin byte stream into logical key events: literal bytes
// (printables and control codes) and the named navigation keys the viewer
// dispatches on. Handles every encoding the classic terminals send:
//
// - CSI sequences: ESC [ A/B/C/D (arrows), ESC [ H / ESC [ F (home/end)
// - Tilde-terminated CSI: ESC [ 1~/3~/4~/5~/6~/7~/8~ (home, delete, end,
//   page up, page down, and the alternate home/end encodings)
// - SS3 sequences: ESC O H / ESC O F (home/end from some terminals)
//
// # Design
//
// Decoding is an explicit state machine rather than nested reads. The
// transition function [`step`] is pure: it consumes the current state plus
// one input (`Some(byte)` or `None` for a short read) and either emits a
// key or names the next state. [`read_key`] is the thin I/O loop around it.
//
// The ESC ambiguity is resolved by the read timeout: raw mode uses
// `VMIN = 0, VTIME = 1`, so when the user pressed the bare Escape key the
// continuation read comes back empty within 0.1 s and the pending state
// collapses to a plain [`Key::Escape`]. A real escape sequence arrives as
// a burst, so its continuation bytes are already waiting. Short sequences
// therefore never hang the decoder.

use std::io::{self, Read};

// ─── Key ────────────────────────────────────────────────────────────────────

/// A decoded key event.
///
/// Literal input (printable characters and control codes) arrives as
/// [`Byte`](Key::Byte); navigation keys get their own variants, so they can
/// never collide with any byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A literal input byte, control codes included.
    Byte(u8),
    /// The Escape key itself (also the fallback for unrecognized sequences).
    Escape,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
}

/// The byte the terminal sends for CTRL plus a letter key.
///
/// CTRL strips bits 5 and 6 from the pressed key: CTRL-q is
/// `b'q' & 0x1f` = 0x11. Use this to name control bytes in dispatch
/// tables instead of bare hex.
#[must_use]
pub const fn ctrl(key: u8) -> u8 {
    key & 0x1f
}

// ─── Decoder state machine ──────────────────────────────────────────────────

/// Decoder position within a (possible) escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Not inside a sequence; the next byte stands alone unless it is ESC.
    Start,
    /// Consumed ESC; expecting `[`, `O`, or nothing (bare Escape key).
    SawEscape,
    /// Consumed `ESC [`; expecting a letter or a digit.
    SawBracket,
    /// Consumed `ESC [ <digit>`; expecting the terminating `~`.
    SawBracketDigit(u8),
    /// Consumed `ESC O`; expecting `H` or `F`.
    SawO,
}

/// Outcome of one transition: a decoded key, or a new state needing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A key decoded; the machine is back at [`DecodeState::Start`].
    Emit(Key),
    /// More input needed.
    Pending(DecodeState),
}

/// Advance the decoder by one input.
///
/// `byte` is `None` when the read timed out with nothing available: inside
/// a sequence that means the sequence is short, and the pending ESC
/// resolves to a plain Escape key press. In the start state an empty read
/// is not an event at all — the machine just stays put and the caller
/// retries.
///
/// Every unrecognized continuation collapses to [`Key::Escape`]; the
/// machine never needs lookahead and never pushes bytes back.
#[must_use]
pub const fn step(state: DecodeState, byte: Option<u8>) -> Step {
    match (state, byte) {
        (DecodeState::Start, None) => Step::Pending(DecodeState::Start),
        (DecodeState::Start, Some(0x1b)) => Step::Pending(DecodeState::SawEscape),
        (DecodeState::Start, Some(b)) => Step::Emit(Key::Byte(b)),

        (DecodeState::SawEscape, Some(b'[')) => Step::Pending(DecodeState::SawBracket),
        (DecodeState::SawEscape, Some(b'O')) => Step::Pending(DecodeState::SawO),
        (DecodeState::SawEscape, _) => Step::Emit(Key::Escape),

        (DecodeState::SawBracket, Some(d @ b'0'..=b'9')) => {
            Step::Pending(DecodeState::SawBracketDigit(d))
        }
        (DecodeState::SawBracket, Some(b'A')) => Step::Emit(Key::Up),
        (DecodeState::SawBracket, Some(b'B')) => Step::Emit(Key::Down),
        (DecodeState::SawBracket, Some(b'C')) => Step::Emit(Key::Right),
        (DecodeState::SawBracket, Some(b'D')) => Step::Emit(Key::Left),
        (DecodeState::SawBracket, Some(b'H')) => Step::Emit(Key::Home),
        (DecodeState::SawBracket, Some(b'F')) => Step::Emit(Key::End),
        (DecodeState::SawBracket, _) => Step::Emit(Key::Escape),

        (DecodeState::SawBracketDigit(d), Some(b'~')) => Step::Emit(match d {
            b'1' | b'7' => Key::Home,
            b'3' => Key::Delete,
            b'4' | b'8' => Key::End,
            b'5' => Key::PageUp,
            b'6' => Key::PageDown,
            _ => Key::Escape,
        }),
        (DecodeState::SawBracketDigit(_), _) => Step::Emit(Key::Escape),

        (DecodeState::SawO, Some(b'H')) => Step::Emit(Key::Home),
        (DecodeState::SawO, Some(b'F')) => Step::Emit(Key::End),
        (DecodeState::SawO, _) => Step::Emit(Key::Escape),
    }
}

// ─── Blocking read loop ─────────────────────────────────────────────────────

/// Read one byte, mapping the raw-mode timeout to `None`.
///
/// With `VMIN = 0, VTIME = 1` a read returns `Ok(0)` when the 0.1 s window
/// passes with no input. `EAGAIN` and `EINTR` get the same treatment: no
/// byte this attempt, not an error. Everything else is a real I/O failure.
fn read_byte(input: &mut impl Read) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match input.read(&mut buf) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf[0])),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Block until one key decodes.
///
/// Retries empty reads indefinitely while idle (the timeout exists so the
/// process stays responsive, not to give up), but inside an escape
/// sequence an empty read resolves the pending bytes to a plain Escape
/// immediately — a short sequence never hangs.
///
/// # Errors
///
/// Returns an error only for real I/O failures on the underlying reader.
pub fn read_key(input: &mut impl Read) -> io::Result<Key> {
    let mut state = DecodeState::Start;
    loop {
        let byte = read_byte(input)?;
        match step(state, byte) {
            Step::Emit(key) => return Ok(key),
            Step::Pending(next) => state = next,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
