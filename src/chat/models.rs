//! The core models for a single session's conversation log.
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::ErrorKind;
use crate::openai::Role;
use crate::vision::{ImageEncoding, ImagePayload};

/// What the log keeps of an uploaded image. The bytes themselves
/// only live as long as the request that sends them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub file_name: Option<String>,
    pub encoding: ImageEncoding,
    pub byte_len: usize,
}

impl ImageRef {
    pub fn from_payload(payload: &ImagePayload, file_name: Option<&str>) -> Self {
        Self {
            file_name: file_name.map(String::from),
            encoding: payload.encoding,
            byte_len: payload.bytes.len(),
        }
    }

    /// Stand-in text for the image when the bytes are gone
    pub fn placeholder(&self) -> String {
        format!("[image: {}]", self.file_name.as_deref().unwrap_or("upload"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Image(ImageRef),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Parts(Vec<Part>),
}

/// One entry in the conversation log. Only user and assistant turns
/// can be constructed so a system turn never ends up in a log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: TurnContent,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: &str) -> Self {
        Self::new(Role::User, TurnContent::Text(text.to_string()))
    }

    pub fn user_with_image(text: &str, image: ImageRef) -> Self {
        let parts = vec![
            Part::Text {
                text: text.to_string(),
            },
            Part::Image(image),
        ];
        Self::new(Role::User, TurnContent::Parts(parts))
    }

    pub fn assistant(text: &str) -> Self {
        Self::new(Role::Assistant, TurnContent::Text(text.to_string()))
    }

    fn new(role: Role, content: TurnContent) -> Self {
        Self {
            role,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &TurnContent {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Text portions of the turn, joined with newlines
    pub fn text(&self) -> String {
        match &self.content {
            TurnContent::Text(text) => text.clone(),
            TurnContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text { text } => Some(text.as_str()),
                    Part::Image(_) => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_image(&self) -> bool {
        match &self.content {
            TurnContent::Parts(parts) => parts.iter().any(|p| matches!(p, Part::Image(_))),
            TurnContent::Text(_) => false,
        }
    }

    /// Text with images replaced by their placeholder
    pub fn text_with_placeholders(&self) -> String {
        self.lines().join("\n")
    }

    /// Physical lines of the turn as displayed, split at embedded
    /// line breaks. Images show up as their placeholder line.
    pub fn lines(&self) -> Vec<String> {
        match &self.content {
            TurnContent::Text(text) => split_lines(text).map(String::from).collect(),
            TurnContent::Parts(parts) => parts
                .iter()
                .flat_map(|p| match p {
                    Part::Text { text } => split_lines(text).map(String::from).collect::<Vec<_>>(),
                    Part::Image(image) => vec![image.placeholder()],
                })
                .collect(),
        }
    }

    /// User turns need some text or an image
    pub fn ensure_content(&self) -> Result<(), ErrorKind> {
        if self.role == Role::User && !self.has_image() && self.text().trim().is_empty() {
            return Err(ErrorKind::EmptyContent);
        }
        Ok(())
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{1C}' | '\u{1D}' | '\u{1E}' | '\u{85}'
            | '\u{2028}' | '\u{2029}'
    )
}

/// Splits `text` at every line boundary, counting `\r\n` as one. A
/// trailing break doesn't produce an empty last line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text).filter(|t| !t.is_empty());
    std::iter::from_fn(move || {
        let current = rest?;
        match current.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((i, c)) => {
                let mut next = i + c.len_utf8();
                if c == '\r' && current[next..].starts_with('\n') {
                    next += 1;
                }
                rest = Some(&current[next..]).filter(|t| !t.is_empty());
                Some(&current[..i])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Ordered, append-only log of turns for one session
#[derive(Clone, Debug, Default)]
pub struct Transcript(Vec<Turn>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn append(&mut self, turn: Turn) -> Result<(), ErrorKind> {
        turn.ensure_content()?;
        self.0.push(turn);
        Ok(())
    }

    pub fn all(&self) -> &[Turn] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }
}
