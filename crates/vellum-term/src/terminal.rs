// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, window geometry, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd reads/writes. These are
// the standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It enters raw mode via termios
// and guarantees restoration on drop — even if the viewer panics mid-frame.
//
// The panic hook deserves special mention: it bypasses Rust's stdout lock
// entirely, writing a pre-built restore sequence directly to fd 1. This
// prevents deadlock if the panic happened while holding the stdout lock
// (common during frame rendering). One raw write, termios restored, then
// the original panic handler prints its message to a working terminal.

use std::io::{self, Read, Write};
use std::sync::{Mutex, Once};

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

// ─── Window Geometry ────────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if the call fails or reports zero columns, in which case
/// the caller falls back to the cursor probe.
#[cfg(unix)]
fn ioctl_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            rows: ws.ws_row,
            cols: ws.ws_col,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
fn ioctl_size() -> Option<Size> {
    None
}

/// The terminal's character dimensions.
///
/// Primary path: `ioctl(TIOCGWINSZ)` on stdout. Fallback path (whenever the
/// ioctl errors or reports zero columns): push the cursor to the bottom-right
/// corner with large CUF/CUD arguments, then ask the terminal where it landed
/// via a Device Status Report. Requires raw mode, so the DSR reply can be
/// read byte-by-byte without waiting for a newline.
///
/// # Errors
///
/// Returns an error if both paths fail. A renderable viewport size is
/// mandatory; callers treat this as fatal at startup.
pub fn window_size() -> io::Result<Size> {
    if let Some(size) = ioctl_size() {
        return Ok(size);
    }

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    probe_size(&mut TtyReader::new(), &mut lock)
}

/// Window-size fallback probe over explicit streams.
///
/// Writes the bottom-right clamp and the DSR query to `out`, then collects
/// the reply from `input` up to the terminating `R` (or 32 bytes, whichever
/// comes first) and parses it. Split out from [`window_size`] so the reply
/// handling can be exercised against simulated terminals.
///
/// # Errors
///
/// Returns an error if writing the probe fails, a read fails with a real
/// I/O error, or the collected reply does not parse as a cursor report.
pub fn probe_size(input: &mut impl Read, out: &mut impl Write) -> io::Result<Size> {
    ansi::cursor_to_bottom_right(out)?;
    ansi::query_cursor_position(out)?;
    out.flush()?;

    let mut reply = Vec::with_capacity(32);
    let mut byte = [0u8; 1];
    while reply.len() < 32 {
        match input.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                reply.push(byte[0]);
                if byte[0] == b'R' {
                    break;
                }
            }
            Err(e) if matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ) =>
            {
                break;
            }
            Err(e) => return Err(e),
        }
    }

    parse_cursor_report(&reply).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "cursor position report: malformed reply",
        )
    })
}

/// Parse a DSR cursor-position reply: `ESC [ <rows> ; <cols> R`.
///
/// The trailing `R` is optional (the probe may stop short on timeout after
/// the digits). Both dimensions must be positive.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let reply = reply.strip_suffix(b"R").unwrap_or(reply);
    let params = reply.strip_prefix(b"\x1b[")?;
    let sep = params.iter().position(|&b| b == b';')?;

    let rows = parse_u16(&params[..sep])?;
    let cols = parse_u16(&params[sep + 1..])?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(Size { rows, cols })
}

/// Parse an all-digits byte slice as a u16, saturating on overflow.
fn parse_u16(bytes: &[u8]) -> Option<u16> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut val: u16 = 0;
    for &b in bytes {
        val = val.saturating_mul(10).saturating_add(u16::from(b - b'0'));
    }
    Some(val)
}

// ─── Raw stdin ──────────────────────────────────────────────────────────────

/// Unbuffered reader over the stdin file descriptor.
///
/// `std::io::Stdin` buffers reads, which would fight the byte-at-a-time
/// decode loop and the VTIME timeout semantics. This reader issues one
/// `read(2)` per call: in raw mode with `VMIN = 0, VTIME = 1`, that call
/// returns within 0.1 s with zero bytes when no key was pressed.
#[derive(Debug, Default)]
pub struct TtyReader;

impl TtyReader {
    /// Create a reader over the stdin fd. No resources are acquired.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Read for TtyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 guaranteed above.
        Ok(n as usize)
    }
}

#[cfg(not(unix))]
impl Read for TtyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::stdin().lock().read(buf)
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`RawSession`] struct owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Screen restore sequence for emergency use: clear the screen, home the
/// cursor, and make sure the cursor is visible again (a panic can land
/// between the hide and show of a frame redraw).
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. The hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock), restores termios, then delegates to the
/// original panic handler so the error prints to a working terminal.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the screen restore sequence directly to stdout's file descriptor.
#[cfg(unix)]
fn emergency_restore() {
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }
}

#[cfg(not(unix))]
fn emergency_restore() {
    let _ = io::stdout().write_all(EMERGENCY_RESTORE);
    let _ = io::stdout().flush();
}

// ─── RawSession ─────────────────────────────────────────────────────────────

/// Wrap the current OS error with the name of the operation that failed.
fn os_err(op: &str) -> io::Error {
    let err = io::Error::last_os_error();
    io::Error::new(err.kind(), format!("{op}: {err}"))
}

/// Raw-mode terminal session with RAII cleanup.
///
/// [`enter`](Self::enter) captures the current terminal discipline and
/// applies raw mode. The original discipline is restored when the session
/// is dropped — on normal quit, on error return, and (via the panic hook)
/// on panic. Raw mode here means:
///
/// - no echo, no canonical line buffering
/// - no signal keys (CTRL-c, CTRL-z), no extended input processing
/// - no output post-processing (`\n` stays `\n`, so frames emit `\r\n`)
/// - no CR/NL input translation, no parity check, no 8th-bit stripping,
///   no start/stop flow control, no break-condition signaling
/// - 8-bit character size
/// - `VMIN = 0, VTIME = 1`: a read returns after at most 0.1 s, with
///   zero bytes if no key was pressed
///
/// # Example
///
/// ```no_run
/// use vellum_term::terminal::RawSession;
///
/// let session = RawSession::enter()?;
/// // ... render frames, read keys ...
/// drop(session); // terminal restored
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct RawSession {
    /// Original termios saved before entering raw mode. `None` after restore.
    #[cfg(unix)]
    original: Option<libc::termios>,
}

impl RawSession {
    /// Capture the terminal discipline and switch to raw mode.
    ///
    /// Also installs the process-wide panic hook (once) and stashes the
    /// captured termios in the global backup the hook reads from.
    ///
    /// # Errors
    ///
    /// Returns an error if `tcgetattr` or `tcsetattr` fails. There is no
    /// retry: a terminal that cannot be configured is an unusable
    /// environment for a raw-mode viewer.
    #[cfg(unix)]
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        let fd = libc::STDIN_FILENO;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(os_err("tcgetattr"));
            }

            let original = termios;

            // Also save to the global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(original);
            }

            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
            termios.c_cflag |= libc::CS8;

            // VMIN=0, VTIME=1: read() waits at most a tenth of a second and
            // may return zero bytes. The decode loop retries; the process
            // stays responsive instead of parking forever in a syscall.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(os_err("tcsetattr"));
            }

            Ok(Self {
                original: Some(original),
            })
        }
    }

    #[cfg(not(unix))]
    pub fn enter() -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode requires a POSIX terminal",
        ))
    }

    /// Restore the original terminal discipline and repaint a clean screen.
    ///
    /// Clears the screen, homes the cursor, re-shows the cursor, then
    /// reapplies the captured termios. Every exit path wants exactly this
    /// sequence, so it lives here rather than at each call site.
    /// Idempotent: a second call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the screen reset cannot be written or
    /// `tcsetattr` fails.
    #[cfg(unix)]
    pub fn restore(&mut self) -> io::Result<()> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };

        {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            ansi::clear_screen(&mut lock)?;
            ansi::cursor_home(&mut lock)?;
            ansi::cursor_show(&mut lock)?;
            lock.flush()?;
        }

        unsafe {
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                return Err(os_err("tcsetattr"));
            }
        }

        // Clear the global backup — we've restored successfully.
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RawSession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
