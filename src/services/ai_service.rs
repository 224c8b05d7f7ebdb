use serde_json::Value;

use crate::error::Result;
use crate::services::prompts::Prompt;
use crate::services::validation::ObjectSchema;

/// Trait for AI services (OpenRouter, test doubles, etc.)
///
/// One call per `invoke`: no retries, no caching. The returned value has
/// already been checked against `schema`.
#[async_trait::async_trait]
pub trait AiService: Send + Sync {
    async fn invoke(&self, prompt: &Prompt, schema: &ObjectSchema) -> Result<Value>;
}
