use async_trait::async_trait;

use super::assembler::CompletionRequest;
use crate::core::ErrorKind;

/// The hosted model that turns an assembled request into a reply.
/// One request, one response: no streaming and no partial results.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ErrorKind>;
}
