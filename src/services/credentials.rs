use std::sync::{Arc, RwLock};

use crate::error::{AssistantError, Result};

/// The user's API key for this session. Held in memory only, never persisted.
#[derive(Clone, Default)]
pub struct Credentials {
    api_key: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new(initial: Option<String>) -> Self {
        let creds = Self::default();
        if let Some(key) = initial {
            // A blank env value just leaves the store empty
            let _ = creds.set(&key);
        }
        creds
    }

    pub fn set(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AssistantError::validation("apiKey", "must not be empty"));
        }
        *self.api_key.write().unwrap_or_else(|e| e.into_inner()) = Some(key.to_string());
        log::info!("🔑 API key set for this session");
        Ok(())
    }

    pub fn clear(&self) {
        *self.api_key.write().unwrap_or_else(|e| e.into_inner()) = None;
        log::info!("🔑 API key cleared");
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_confirmed(&self) -> bool {
        self.api_key.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("confirmed", &self.is_confirmed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let creds = Credentials::default();
        assert!(!creds.is_confirmed());

        creds.set("  sk-or-123 ").unwrap();
        assert_eq!(creds.api_key().as_deref(), Some("sk-or-123"));

        let shared = creds.clone();
        shared.clear();
        assert!(!creds.is_confirmed());
    }

    #[test]
    fn test_blank_key_rejected() {
        let creds = Credentials::new(Some("   ".to_string()));
        assert!(!creds.is_confirmed());
        assert_eq!(creds.set("").unwrap_err().field(), Some("apiKey"));
    }

    #[test]
    fn test_debug_hides_key() {
        let creds = Credentials::new(Some("sk-secret".to_string()));
        assert!(!format!("{:?}", creds).contains("sk-secret"));
    }
}
