//! A session owns one conversation log and runs every action on it
//! to completion before the next one starts.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::assembler::assemble;
use super::gateway::ModelGateway;
use super::models::{ImageRef, Transcript, Turn};
use crate::ai::prompt::Prompt;
use crate::core::ErrorKind;
use crate::export::{GlyphPolicy, export_transcript};
use crate::vision::{ImagePayload, normalize};

pub struct Session {
    id: String,
    instruction: String,
    transcript: Transcript,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(instruction: &str) -> Self {
        Self::with_id(&Uuid::new_v4().to_string(), instruction)
    }

    pub fn with_id(id: &str, instruction: &str) -> Self {
        Self {
            id: id.to_string(),
            instruction: instruction.to_string(),
            transcript: Transcript::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn turns(&self) -> &[Turn] {
        self.transcript.all()
    }

    /// Sends a text message and records the exchange. Returns the
    /// reply.
    pub async fn submit(
        &mut self,
        gateway: &dyn ModelGateway,
        text: &str,
    ) -> Result<String, ErrorKind> {
        self.exchange(gateway, Turn::user(text), None).await
    }

    /// Normalizes an uploaded image and sends it with `caption`. A
    /// blank caption is replaced with a generic review request. A bad
    /// upload fails before anything is sent.
    pub async fn submit_image(
        &mut self,
        gateway: &dyn ModelGateway,
        caption: &str,
        upload: &[u8],
        file_name: Option<&str>,
    ) -> Result<String, ErrorKind> {
        let image = normalize(upload)
            .inspect_err(|e| tracing::warn!("Session {}: rejected upload: {}", self.id, e))?;
        let caption = if caption.trim().is_empty() {
            Prompt::ImageReview.text()
        } else {
            caption
        };
        let turn = Turn::user_with_image(caption, ImageRef::from_payload(&image, file_name));
        self.exchange(gateway, turn, Some(image)).await
    }

    // The user turn is only recorded together with its reply so a
    // failed request leaves the log exactly as it was.
    async fn exchange(
        &mut self,
        gateway: &dyn ModelGateway,
        user_turn: Turn,
        image: Option<ImagePayload>,
    ) -> Result<String, ErrorKind> {
        user_turn.ensure_content()?;

        let request = assemble(
            &self.instruction,
            self.transcript.all(),
            &user_turn,
            image.as_ref(),
        );
        // The encoded image is part of the request now
        drop(image);

        let reply = gateway
            .complete(&request)
            .await
            .inspect_err(|e| tracing::error!("Session {}: {}", self.id, e))?;

        self.transcript.append(user_turn)?;
        self.transcript.append(Turn::assistant(&reply))?;
        tracing::info!(
            "Session {}: exchange complete, {} turns",
            self.id,
            self.transcript.len()
        );

        Ok(reply)
    }

    pub fn export(&self, policy: GlyphPolicy) -> Result<Vec<u8>, ErrorKind> {
        export_transcript(self.transcript.all(), policy)
    }

    pub fn reset(&mut self) {
        self.transcript.clear();
        tracing::info!("Session {}: reset", self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, RgbImage};

    use super::*;
    use crate::chat::{CompletionRequest, RequestShape};
    use crate::openai::Role;

    /// Replies from a script and remembers every request
    #[derive(Default)]
    struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, ErrorKind>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Result<String, ErrorKind>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ErrorKind> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()))
        }
    }

    fn failure() -> Result<String, ErrorKind> {
        Err(ErrorKind::GatewayFailure("provider error (500): boom".to_string()))
    }

    fn png() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(4, 4))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_log_grows_by_two_per_exchange() {
        let gateway = ScriptedGateway::default();
        let mut session = Session::new("instruction");

        for i in 0..5 {
            session.submit(&gateway, &format!("question {}", i)).await.unwrap();
            assert_eq!(session.turns().len(), 2 * (i + 1));
        }

        let roles: Vec<Role> = session.turns().iter().map(Turn::role).collect();
        for pair in roles.chunks(2) {
            assert_eq!(pair, [Role::User, Role::Assistant]);
        }
        assert_eq!(session.turns()[8].text(), "question 4");
    }

    #[tokio::test]
    async fn test_prior_exchange_is_resent() {
        let gateway = ScriptedGateway::new(vec![Ok("Hi there".to_string())]);
        let mut session = Session::new("instruction");
        session.submit(&gateway, "Hello").await.unwrap();
        session.submit(&gateway, "Next").await.unwrap();

        let requests = gateway.requests();
        let roles: Vec<Role> = requests[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_log_unchanged() {
        let gateway = ScriptedGateway::new(vec![Ok("first".to_string()), failure()]);
        let mut session = Session::new("instruction");
        session.submit(&gateway, "one").await.unwrap();
        let before = session.turns().to_vec();

        let err = session.submit(&gateway, "two").await.unwrap_err();
        assert!(matches!(err, ErrorKind::GatewayFailure(_)));
        assert_eq!(session.turns(), before.as_slice());

        // The user can resubmit afterwards
        session.submit(&gateway, "two").await.unwrap();
        assert_eq!(session.turns().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_message_is_not_sent() {
        let gateway = ScriptedGateway::default();
        let mut session = Session::new("instruction");
        assert_eq!(
            session.submit(&gateway, "   ").await,
            Err(ErrorKind::EmptyContent)
        );
        assert!(gateway.requests().is_empty());
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_submit_image() {
        let gateway = ScriptedGateway::new(vec![Ok("Stage 2".to_string())]);
        let mut session = Session::new("instruction");
        let reply = session
            .submit_image(&gateway, "", &png(), Some("heel.png"))
            .await
            .unwrap();
        assert_eq!(reply, "Stage 2");

        let requests = gateway.requests();
        assert_eq!(requests[0].shape, RequestShape::Vision);
        assert!(session.turns()[0].has_image());
        assert_eq!(session.turns()[0].text(), Prompt::ImageReview.text());
        assert_eq!(session.turns()[0].lines()[1], "[image: heel.png]");
    }

    #[tokio::test]
    async fn test_invalid_image_is_not_sent() {
        let gateway = ScriptedGateway::default();
        let mut session = Session::new("instruction");
        session.submit(&gateway, "Hello").await.unwrap();

        let err = session
            .submit_image(&gateway, "look", b"not an image", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidImage(_)));
        assert_eq!(gateway.requests().len(), 1);
        assert_eq!(session.turns().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_and_export() {
        let gateway = ScriptedGateway::new(vec![Ok("Hi there".to_string())]);
        let mut session = Session::new("instruction");
        session.submit(&gateway, "Hello").await.unwrap();

        let pdf = session.export(GlyphPolicy::Strict).unwrap();
        let pdf = String::from_utf8_lossy(&pdf).to_string();
        assert!(pdf.contains("(You: Hello) Tj"));
        assert!(pdf.contains("(WoundBot: Hi there) Tj"));
        // Export doesn't touch the log
        assert_eq!(session.turns().len(), 2);

        session.reset();
        assert!(session.turns().is_empty());
        session.reset();
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_failed_export_keeps_log() {
        let gateway = ScriptedGateway::new(vec![Ok("伤口".to_string())]);
        let mut session = Session::new("instruction");
        session.submit(&gateway, "Hello").await.unwrap();

        assert_eq!(
            session.export(GlyphPolicy::Strict),
            Err(ErrorKind::UnsupportedGlyph { glyph: '伤' })
        );
        assert_eq!(session.turns().len(), 2);
        assert!(session.export(GlyphPolicy::Substitute).is_ok());
    }
}
