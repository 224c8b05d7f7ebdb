use std::sync::Arc;

use crate::error::{AssistantError, Result};
use crate::models::{ChatRequest, ChatResult, ModerationRequest, ModerationResult, RecipeRequest, RecipeResult};
use crate::services::ai_service::AiService;
use crate::services::prompts;
use crate::services::validation::{CHAT_OUTPUT, MODERATION_OUTPUT, RECIPE_OUTPUT};

pub const DEFAULT_REJECTION_PROMPT: &str = "Please upload a photo of food.";

/// The three model-backed operations: moderation, recipe generation and cooking Q&A.
#[derive(Clone)]
pub struct RecipeAssistant {
    ai: Arc<dyn AiService>,
}

impl RecipeAssistant {
    pub fn new(ai: Arc<dyn AiService>) -> Self {
        Self { ai }
    }

    pub async fn moderate_image(&self, request: &ModerationRequest) -> Result<ModerationResult> {
        let photo = request.validate()?;
        log::info!("🔍 Moderating image {}", photo.preview());

        let value = self.ai.invoke(&prompts::moderation_prompt(photo), &MODERATION_OUTPUT).await?;
        let mut result: ModerationResult = MODERATION_OUTPUT.parse(value)?;

        // Keep the invariant: prompt is non-empty exactly when the image is not food
        if result.is_food {
            result.prompt.clear();
        } else if result.prompt.trim().is_empty() {
            result.prompt = DEFAULT_REJECTION_PROMPT.to_string();
        }

        log::info!("🔍 Moderation verdict: is_food={}", result.is_food);
        Ok(result)
    }

    pub async fn generate_recipe(&self, request: &RecipeRequest) -> Result<RecipeResult> {
        let photo = request.validate()?;
        let language = request.language.as_deref();
        log::info!(
            "👨‍🍳 Generating recipe in {} for {}",
            prompts::effective_language(language),
            photo.preview()
        );

        let value = self.ai.invoke(&prompts::recipe_prompt(photo, language), &RECIPE_OUTPUT).await?;
        let result: RecipeResult = RECIPE_OUTPUT.parse(value)?;

        if result.recipe.trim().is_empty() {
            return Err(AssistantError::schema("RecipeResult field 'recipe' is empty"));
        }
        Ok(result)
    }

    pub async fn answer_question(&self, request: &ChatRequest) -> Result<ChatResult> {
        request.validate()?;
        log::info!(
            "💬 Answering question (recipe context: {}, language: {})",
            request.recipe.as_deref().map_or(false, |r| !r.trim().is_empty()),
            prompts::effective_language(request.language.as_deref())
        );

        let prompt = prompts::chat_prompt(&request.question, request.recipe.as_deref(), request.language.as_deref());
        let value = self.ai.invoke(&prompt, &CHAT_OUTPUT).await?;
        CHAT_OUTPUT.parse(value)
    }
}
