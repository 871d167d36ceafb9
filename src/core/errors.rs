//! The closed set of failures a single chat action can end with.
use thiserror::Error;

/// Every failure is terminal for the action that produced it and
/// never for the session. None of them leave the conversation log
/// partially modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The upload could not be decoded as an image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Transport, auth, request or provider side failure talking to
    /// the model
    #[error("Model gateway failure: {0}")]
    GatewayFailure(String),

    /// The transcript contains a character the document font can't
    /// render
    #[error("Unsupported glyph {glyph:?} (U+{:04X}) in transcript", codepoint(.glyph))]
    UnsupportedGlyph { glyph: char },

    /// A user turn needs text or an image
    #[error("Message is empty")]
    EmptyContent,
}

fn codepoint(c: &char) -> u32 {
    *c as u32
}

impl ErrorKind {
    /// Stable machine readable name, used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidImage(_) => "invalid_image",
            ErrorKind::GatewayFailure(_) => "gateway_failure",
            ErrorKind::UnsupportedGlyph { .. } => "unsupported_glyph",
            ErrorKind::EmptyContent => "empty_content",
        }
    }
}
