mod assembler;
mod gateway;
mod models;
mod session;

pub use assembler::{CompletionRequest, RequestShape, assemble};
pub use gateway::ModelGateway;
pub use models::{ImageRef, Part, Transcript, Turn, TurnContent};
pub use session::Session;
