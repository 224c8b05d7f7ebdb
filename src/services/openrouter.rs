use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{AssistantError, Result};
use crate::services::ai_service::AiService;
use crate::services::credentials::Credentials;
use crate::services::prompts::Prompt;
use crate::services::validation::ObjectSchema;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

pub struct OpenRouterService {
    credentials: Credentials,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenRouterService {
    pub fn new(credentials: Credentials, model: String, base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            credentials,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens: None,
            client,
        })
    }

    /// Cap completion length. Uncapped by default so long recipes are not cut mid-JSON.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &Prompt, schema: &ObjectSchema) -> ChatRequest {
        let mut content = vec![ContentPart::Text {
            content_type: "text".to_string(),
            text: prompt.instructions.clone(),
        }];
        if let Some(image) = &prompt.image {
            content.push(ContentPart::ImageUrl {
                content_type: "image_url".to_string(),
                image_url: ImageData {
                    url: image.as_str().to_string(),
                },
            });
        }

        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: schema.name.to_string(),
                    strict: true,
                    schema: schema.to_json_schema(),
                },
            },
        }
    }

    /// Turn the raw chat-completions body into the structured value the schema declares.
    fn parse_response(&self, body: &str, schema: &ObjectSchema) -> Result<Value> {
        let chat_response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| AssistantError::schema(format!("malformed completion envelope: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AssistantError::schema("completion contained no message content"))?;

        log::debug!("💬 OpenRouter response content: {}", content);

        let value: Value = serde_json::from_str(strip_code_fence(&content))
            .map_err(|e| AssistantError::schema(format!("{} reply is not JSON: {}", schema.name, e)))?;
        schema.check(&value)?;
        Ok(value)
    }
}

/// Models sometimes wrap JSON in a ```json fence despite the response format.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[async_trait::async_trait]
impl AiService for OpenRouterService {
    async fn invoke(&self, prompt: &Prompt, schema: &ObjectSchema) -> Result<Value> {
        let api_key = self
            .credentials
            .api_key()
            .ok_or_else(|| AssistantError::transport("No API key has been set for this session"))?;

        let request = self.build_request(prompt, schema);

        log::info!("🤖 Sending {} request to OpenRouter with model: {}", schema.name, self.model);
        if let Some(image) = &prompt.image {
            log::debug!("🖼️ Attached image: {}", image.preview());
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "https://github.com/recipe-snap")
            .header("X-Title", "Recipe Snap")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 OpenRouter response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ OpenRouter API error ({}): {}", status, error_text);
            return Err(AssistantError::transport(format!(
                "OpenRouter API error ({}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        log::debug!("📄 Raw OpenRouter response size: {} bytes", body.len());

        let value = self.parse_response(&body, schema)?;
        log::info!("✅ Received {} from OpenRouter", schema.name);
        Ok(value)
    }
}
