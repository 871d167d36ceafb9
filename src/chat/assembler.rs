//! Builds the request sent to the model for the current turn: the
//! system instruction, the whole log and then the new user turn. The
//! log is always sent in full.
use super::models::{Turn, TurnContent};
use crate::openai::{ContentPart, Message, Role};
use crate::vision::ImagePayload;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestShape {
    Text,
    /// The current turn carries an inline image
    Vision,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub shape: RequestShape,
    pub messages: Vec<Message>,
}

fn prior_message(turn: &Turn) -> Message {
    match turn.content() {
        TurnContent::Text(text) => Message::new(turn.role(), text),
        // Images from earlier turns were dropped after their own
        // request so only the placeholder is resent
        TurnContent::Parts(_) => Message::new(turn.role(), &turn.text_with_placeholders()),
    }
}

pub fn assemble(
    instruction: &str,
    log: &[Turn],
    current: &Turn,
    image: Option<&ImagePayload>,
) -> CompletionRequest {
    let mut messages = Vec::with_capacity(log.len() + 2);
    messages.push(Message::new(Role::System, instruction));
    messages.extend(log.iter().map(prior_message));

    let shape = match image {
        Some(image) => {
            messages.push(Message::new_with_parts(
                current.role(),
                vec![
                    ContentPart::text(&current.text()),
                    ContentPart::image_url(&image.data_uri()),
                ],
            ));
            RequestShape::Vision
        }
        None => {
            messages.push(prior_message(current));
            RequestShape::Text
        }
    };

    tracing::debug!(
        "Assembled {:?} request with {} messages",
        shape,
        messages.len()
    );

    CompletionRequest { shape, messages }
}
