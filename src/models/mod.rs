use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An image encoded inline as `data:<mimetype>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    raw: String,
    mime_end: usize,
}

impl DataUri {
    /// Parse a data URI, returning the reason on failure.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let rest = raw
            .strip_prefix("data:")
            .ok_or_else(|| "must start with 'data:'".to_string())?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| "must have the form 'data:<mimetype>;base64,<data>'".to_string())?;

        let valid_mime = match mime.split_once('/') {
            Some((kind, sub)) => {
                !kind.is_empty()
                    && !sub.is_empty()
                    && mime
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || "/+-._".contains(c))
            }
            None => false,
        };
        if !valid_mime {
            return Err(format!("'{}' is not a valid MIME type", mime));
        }
        if payload.is_empty() {
            return Err("base64 payload is empty".to_string());
        }
        if general_purpose::STANDARD.decode(payload).is_err() {
            return Err("payload is not valid base64".to_string());
        }

        Ok(Self {
            raw: raw.to_string(),
            mime_end: "data:".len() + mime.len(),
        })
    }

    /// Encode raw file bytes as a data URI.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self, String> {
        if bytes.is_empty() {
            return Err("image is empty".to_string());
        }
        let encoded = general_purpose::STANDARD.encode(bytes);
        Self::parse(&format!("data:{};base64,{}", mime_type, encoded))
    }

    pub fn mime_type(&self) -> &str {
        &self.raw["data:".len()..self.mime_end]
    }

    pub fn payload(&self) -> &str {
        &self.raw[self.mime_end + ";base64,".len()..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Short form for log lines
    pub fn preview(&self) -> String {
        format!("data:{};base64,... ({} bytes)", self.mime_type(), self.payload().len())
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    pub photo_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    pub is_food: bool,
    /// Message asking for a food photo; empty when the image is food
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    pub food_photo_data_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeResult {
    pub recipe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: ChatSender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    Moderating,
    ImageAccepted,
    GeneratingRecipe,
    RecipeReady,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Moderating => "moderating",
            SessionPhase::ImageAccepted => "imageAccepted",
            SessionPhase::GeneratingRecipe => "generatingRecipe",
            SessionPhase::RecipeReady => "recipeReady",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Last user-visible message (what the browser shows as a toast or alert).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, title: title.to_string(), message: message.into() }
    }

    pub fn warning(title: &str, message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Warning, title: title.to_string(), message: message.into() }
    }

    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, title: title.to_string(), message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub generation: u64,
    pub current_image: Option<String>,
    pub moderation: Option<ModerationResult>,
    pub recipe: Option<String>,
    pub chat_history: Vec<ChatMessage>,
    pub chat_pending: usize,
    pub selected_language: String,
    pub api_key_confirmed: bool,
    pub notice: Option<Notice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_parts() {
        let uri = DataUri::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(uri.mime_type(), "image/png");
        assert_eq!(uri.payload(), "aGVsbG8=");
        assert_eq!(uri.preview(), "data:image/png;base64,... (8 bytes)");
    }

    #[test]
    fn test_data_uri_rejects_malformed() {
        assert!(DataUri::parse("image/png;base64,aGVsbG8=").is_err());
        assert!(DataUri::parse("data:image/png,aGVsbG8=").is_err());
        assert!(DataUri::parse("data:;base64,aGVsbG8=").is_err());
        assert!(DataUri::parse("data:image;base64,aGVsbG8=").is_err());
        assert!(DataUri::parse("data:image/png;base64,").is_err());
        assert!(DataUri::parse("data:image/png;base64,not base64!").is_err());
    }

    #[test]
    fn test_data_uri_from_bytes() {
        let uri = DataUri::from_bytes("image/jpeg", b"hello").unwrap();
        assert_eq!(uri.as_str(), "data:image/jpeg;base64,aGVsbG8=");
        assert!(DataUri::from_bytes("image/jpeg", b"").is_err());
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let json = serde_json::to_value(ModerationResult { is_food: true, prompt: String::new() }).unwrap();
        assert_eq!(json, serde_json::json!({"isFood": true, "prompt": ""}));

        let request: RecipeRequest =
            serde_json::from_str(r#"{"foodPhotoDataUri": "data:image/png;base64,aGVsbG8="}"#).unwrap();
        assert_eq!(request.language, None);
    }
}
