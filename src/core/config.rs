use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::ai::prompt::Prompt;
use crate::export::GlyphPolicy;

/// Default download name for transcript exports
pub const EXPORT_FILE_NAME: &str = "WoundCareChat.pdf";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_model: String,
    pub openai_vision_model: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub system_message: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Sessions unused for this long are dropped
    pub session_idle_timeout: Duration,
    pub export_glyph_policy: GlyphPolicy,
    pub export_file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let openai_api_hostname = env::var("WOUNDBOT_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("OPENAI_API_KEY is not set, model requests will fail to authenticate");
            String::new()
        });
        let openai_model =
            env::var("WOUNDBOT_LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let openai_vision_model =
            env::var("WOUNDBOT_VISION_MODEL").unwrap_or_else(|_| openai_model.clone());
        let system_message = env::var("WOUNDBOT_SYSTEM_MESSAGE")
            .unwrap_or_else(|_| Prompt::WoundCare.text().to_string());
        let request_timeout = parse_var::<u64>("WOUNDBOT_REQUEST_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(120));
        let max_upload_bytes =
            parse_var::<usize>("WOUNDBOT_MAX_UPLOAD_BYTES").unwrap_or(20 * 1024 * 1024);
        let session_idle_timeout = parse_var::<u64>("WOUNDBOT_SESSION_IDLE_SECS")
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60 * 60));
        let export_glyph_policy =
            parse_var::<GlyphPolicy>("WOUNDBOT_EXPORT_GLYPHS").unwrap_or_default();

        Self {
            openai_model,
            openai_vision_model,
            openai_api_hostname,
            openai_api_key,
            system_message,
            request_timeout,
            max_upload_bytes,
            session_idle_timeout,
            export_glyph_policy,
            export_file_name: EXPORT_FILE_NAME.to_string(),
        }
    }
}

fn parse_var<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = env::var(name).ok()?;
    parse_value(name, &value)
}

// Unparseable values fall back to the default but aren't silent
fn parse_value<T>(name: &str, value: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!("Ignoring invalid {}={:?}, using the default: {}", name, value, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(
            parse_value::<GlyphPolicy>("WOUNDBOT_EXPORT_GLYPHS", "Strict"),
            Some(GlyphPolicy::Strict)
        );
        assert_eq!(parse_value::<u64>("WOUNDBOT_REQUEST_TIMEOUT_SECS", "30"), Some(30));
    }

    #[test]
    fn test_parse_value_rejects_typos() {
        assert_eq!(
            parse_value::<GlyphPolicy>("WOUNDBOT_EXPORT_GLYPHS", "strikt"),
            None
        );
        assert_eq!(parse_value::<u64>("WOUNDBOT_REQUEST_TIMEOUT_SECS", "2m"), None);
        assert_eq!(parse_value::<usize>("WOUNDBOT_MAX_UPLOAD_BYTES", "-1"), None);
    }
}
