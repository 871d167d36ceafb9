//! The document fonts are the PDF base-14 Type 1 fonts with
//! WinAnsiEncoding, so only Latin-1 and the CP1252 punctuation block
//! can be drawn.
use std::fmt;
use std::str::FromStr;

use anyhow::{Error, anyhow};

use crate::core::ErrorKind;

/// What to do with characters the document font can't render
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlyphPolicy {
    /// Transliterate common symbols and replace anything else with `?`
    #[default]
    Substitute,
    /// Fail the export with `ErrorKind::UnsupportedGlyph`
    Strict,
}

impl FromStr for GlyphPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substitute" => Ok(GlyphPolicy::Substitute),
            "strict" => Ok(GlyphPolicy::Strict),
            other => Err(anyhow!("Unknown glyph policy: {}", other)),
        }
    }
}

impl fmt::Display for GlyphPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GlyphPolicy::Substitute => write!(f, "substitute"),
            GlyphPolicy::Strict => write!(f, "strict"),
        }
    }
}

/// Byte for `c` in WinAnsiEncoding, if it has one
pub fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' => c as u8,
        '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

fn substitute(c: char) -> &'static str {
    match c {
        '≥' => ">=",
        '≤' => "<=",
        '≠' => "!=",
        '≈' => "~",
        '→' => "->",
        '←' => "<-",
        '↑' => "^",
        '✓' | '✔' => "[x]",
        '−' | '‐' | '‑' | '‒' => "-",
        '\u{2007}' | '\u{2009}' | '\u{200A}' | '\u{202F}' => " ",
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{FE0E}' | '\u{FE0F}' => "",
        c if c.is_control() => "",
        _ => "?",
    }
}

/// Rewrites `line` so every character can be drawn by the document
/// font. Tabs expand to four spaces under either policy.
pub fn sanitize(line: &str, policy: GlyphPolicy) -> Result<String, ErrorKind> {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if c == '\t' {
            out.push_str("    ");
        } else if win_ansi_byte(c).is_some() {
            out.push(c);
        } else {
            match policy {
                GlyphPolicy::Strict => return Err(ErrorKind::UnsupportedGlyph { glyph: c }),
                GlyphPolicy::Substitute => out.push_str(substitute(c)),
            }
        }
    }
    Ok(out)
}
