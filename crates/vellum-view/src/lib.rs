//! vellum-view — viewer core for vellum.
//!
//! The pieces between a file on disk and a frame on screen: the row
//! buffer holding loaded lines, the view state tracking cursor and
//! scroll offsets, and the renderer projecting both into one ANSI
//! frame. Terminal plumbing (raw mode, key decoding, the output
//! buffer) lives in `vellum-term`.

pub mod render;
pub mod row;
pub mod view;
