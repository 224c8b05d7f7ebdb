use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

/// Failures of the recipe assistant operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// Malformed input, caught before any network call
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Network, auth or quota failure talking to the model
    #[error("{0}. Please check that your API key is correct and try again.")]
    Transport(String),

    /// The model replied but the output did not match the declared shape
    #[error("Unexpected response from the AI service: {0}")]
    SchemaViolation(String),
}

impl AssistantError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AssistantError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        AssistantError::Transport(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        AssistantError::SchemaViolation(message.into())
    }

    /// Field name for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            AssistantError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AssistantError::Transport(format!("AI service request timed out: {}", e))
        } else {
            AssistantError::Transport(format!("AI service request failed: {}", e))
        }
    }
}
