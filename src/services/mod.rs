pub mod ai_service;
pub mod assistant; // moderation, recipe and chat operations
pub mod credentials;
pub mod openrouter; // OpenRouter AI service
pub mod prompts;
pub mod validation;

pub use assistant::RecipeAssistant;
pub use credentials::Credentials;
pub use openrouter::OpenRouterService;
