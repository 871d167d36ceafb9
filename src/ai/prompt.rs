//! Fixed prompts. The system instruction is chosen once when the
//! process is configured and is never edited at runtime.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Preamble sent as the system entry of every request
    WoundCare,
    /// Caption used for an image upload that came without any text
    ImageReview,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const WOUND_CARE_PROMPT: &str = "You are a wound care expert answering clinical, billing, and CMS-related questions, including infection management, dressing selection, ICD-10/CPT coding, pharmaceutical treatments, and graft layer selection.";

const IMAGE_REVIEW_PROMPT: &str = "Please review this wound image. Describe the wound bed, exudate, periwound skin and any signs of infection, and suggest appropriate dressing options.";

impl Prompt {
    pub fn text(&self) -> &'static str {
        match self {
            Prompt::WoundCare => WOUND_CARE_PROMPT,
            Prompt::ImageReview => IMAGE_REVIEW_PROMPT,
        }
    }
}
