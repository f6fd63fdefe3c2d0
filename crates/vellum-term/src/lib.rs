// SPDX-License-Identifier: MIT
//
// vellum-term — Terminal backend for the vellum viewer.
//
// Raw-mode terminal control, window geometry, ANSI escape output, and
// the escape-sequence key decoder. This crate intentionally avoids
// external TUI frameworks (ratatui, crossterm) in favor of direct
// terminal control via ANSI escape sequences and raw termios. Every
// byte sent to the terminal is accounted for.

pub mod ansi;
pub mod input;
pub mod output;
pub mod terminal;
