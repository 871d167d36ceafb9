mod core;
mod gateway;

pub use self::core::{ContentPart, ImageUrl, Message, MessageContent, Role, completion};
pub use gateway::OpenAiGateway;
