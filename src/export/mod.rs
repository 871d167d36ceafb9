//! Transcript export to a flat, paginated PDF document.
mod glyphs;
mod pdf;
mod transcript;
mod wrap;

pub use glyphs::{GlyphPolicy, sanitize, win_ansi_byte};
pub use transcript::{Block, TITLE, TranscriptDocument, export_transcript, speaker};
pub use wrap::{MAX_LINE_CHARS, wrap_line};
