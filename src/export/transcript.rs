use crate::chat::Turn;
use crate::core::ErrorKind;
use crate::openai::Role;

use super::glyphs::{GlyphPolicy, sanitize};
use super::pdf;

pub const TITLE: &str = "Wound Care Chat Transcript";

/// Speaker label printed in front of every line of a turn
pub fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "WoundBot",
        Role::System => "System",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// One physical line of a turn, prefixed with the speaker
    Paragraph(String),
    /// Blank line between two turns
    Separator,
}

/// The document form of a transcript before pagination
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptDocument {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl TranscriptDocument {
    pub fn from_turns(turns: &[Turn], policy: GlyphPolicy) -> Result<Self, ErrorKind> {
        let mut blocks = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            if i > 0 {
                blocks.push(Block::Separator);
            }
            let label = speaker(turn.role());
            for line in turn.lines() {
                let paragraph = sanitize(&format!("{}: {}", label, line), policy)?;
                blocks.push(Block::Paragraph(paragraph));
            }
        }

        Ok(Self {
            title: TITLE.to_string(),
            blocks,
        })
    }

    pub fn render(&self) -> Vec<u8> {
        pdf::render(&self.title, &self.blocks)
    }
}

/// Renders the conversation log as a standalone PDF file
pub fn export_transcript(turns: &[Turn], policy: GlyphPolicy) -> Result<Vec<u8>, ErrorKind> {
    let doc = TranscriptDocument::from_turns(turns, policy)
        .inspect_err(|e| tracing::warn!("Transcript export failed: {}", e))?;
    Ok(doc.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ImageRef;
    use crate::vision::ImageEncoding;

    fn para(text: &str) -> Block {
        Block::Paragraph(text.to_string())
    }

    #[test]
    fn test_empty_log_has_only_title() {
        let doc = TranscriptDocument::from_turns(&[], GlyphPolicy::default()).unwrap();
        assert_eq!(doc.title, "Wound Care Chat Transcript");
        assert!(doc.blocks.is_empty());

        let pdf = String::from_utf8_lossy(&export_transcript(&[], GlyphPolicy::default()).unwrap())
            .to_string();
        assert!(pdf.contains("(Wound Care Chat Transcript) Tj"));
        assert_eq!(pdf.matches(" Tj ET").count(), 1);
    }

    #[test]
    fn test_one_exchange() {
        let turns = vec![Turn::user("Hello"), Turn::assistant("Hi there")];
        let doc = TranscriptDocument::from_turns(&turns, GlyphPolicy::default()).unwrap();
        assert_eq!(
            doc.blocks,
            vec![para("You: Hello"), Block::Separator, para("WoundBot: Hi there")]
        );

        let pdf = String::from_utf8_lossy(&doc.render()).to_string();
        let you = pdf.find("(You: Hello) Tj").unwrap();
        let bot = pdf.find("(WoundBot: Hi there) Tj").unwrap();
        assert!(you < bot);
    }

    #[test]
    fn test_every_line_is_prefixed() {
        let turns = vec![Turn::assistant(
            "Recommended dressings:\r\n- Foam\n\n- Alginate",
        )];
        let doc = TranscriptDocument::from_turns(&turns, GlyphPolicy::default()).unwrap();
        assert_eq!(
            doc.blocks,
            vec![
                para("WoundBot: Recommended dressings:"),
                para("WoundBot: - Foam"),
                para("WoundBot: "),
                para("WoundBot: - Alginate"),
            ]
        );
    }

    #[test]
    fn test_unusual_line_breaks_start_new_paragraphs() {
        let turns = vec![Turn::assistant("Step one\rStep two\u{2028}Step three")];
        let expected = vec![
            para("WoundBot: Step one"),
            para("WoundBot: Step two"),
            para("WoundBot: Step three"),
        ];

        let doc = TranscriptDocument::from_turns(&turns, GlyphPolicy::Substitute).unwrap();
        assert_eq!(doc.blocks, expected);
        let doc = TranscriptDocument::from_turns(&turns, GlyphPolicy::Strict).unwrap();
        assert_eq!(doc.blocks, expected);
    }

    #[test]
    fn test_image_turn_lines() {
        let image = ImageRef {
            file_name: Some("heel.jpg".to_string()),
            encoding: ImageEncoding::Jpeg,
            byte_len: 2048,
        };
        let turns = vec![Turn::user_with_image("Is this infected?", image)];
        let doc = TranscriptDocument::from_turns(&turns, GlyphPolicy::default()).unwrap();
        assert_eq!(
            doc.blocks,
            vec![para("You: Is this infected?"), para("You: [image: heel.jpg]")]
        );
    }

    #[test]
    fn test_glyph_policy() {
        let turns = vec![Turn::user("Wound size ≥ 2cm 🩹"), Turn::assistant("Noted")];

        let doc = TranscriptDocument::from_turns(&turns, GlyphPolicy::Substitute).unwrap();
        assert_eq!(doc.blocks[0], para("You: Wound size >= 2cm ?"));

        assert_eq!(
            export_transcript(&turns, GlyphPolicy::Strict),
            Err(ErrorKind::UnsupportedGlyph { glyph: '≥' })
        );
    }
}
