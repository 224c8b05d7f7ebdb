use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

use crate::error::{AssistantError, Result};
use crate::models::{
    ChatMessage, ChatRequest, ChatResult, ChatSender, DataUri, ModerationRequest, ModerationResult, Notice,
    RecipeRequest, RecipeResult, SessionPhase, SessionSnapshot,
};
use crate::services::prompts::effective_language;
use crate::services::{Credentials, RecipeAssistant};

pub const CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Marks which upload or recipe request a completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

/// Session data and transitions, free of any I/O.
///
/// Every upload, clear, recipe request and key reset bumps `generation`.
/// A completion whose ticket no longer matches is dropped.
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    generation: u64,
    current_image: Option<DataUri>,
    moderation: Option<ModerationResult>,
    recipe: Option<String>,
    chat_history: Vec<ChatMessage>,
    chat_pending: usize,
    selected_language: String,
    notice: Option<Notice>,
    next_message_id: u64,
}

impl SessionState {
    pub fn new(default_language: &str) -> Self {
        Self {
            phase: SessionPhase::Idle,
            generation: 0,
            current_image: None,
            moderation: None,
            recipe: None,
            chat_history: Vec::new(),
            chat_pending: 0,
            selected_language: effective_language(Some(default_language)).to_string(),
            notice: None,
            next_message_id: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn selected_language(&self) -> &str {
        &self.selected_language
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation
    }

    fn supersede(&mut self) -> Ticket {
        self.generation += 1;
        Ticket { generation: self.generation }
    }

    fn drop_image(&mut self) {
        self.current_image = None;
        self.moderation = None;
        self.recipe = None;
    }

    pub fn begin_upload(&mut self, image: DataUri) -> Ticket {
        let ticket = self.supersede();
        self.drop_image();
        self.current_image = Some(image);
        self.phase = SessionPhase::Moderating;
        self.notice = None;
        ticket
    }

    /// Apply a moderation outcome. Returns false if the ticket was stale.
    pub fn complete_moderation(&mut self, ticket: Ticket, result: Result<ModerationResult>) -> bool {
        if !self.is_current(ticket) || self.phase != SessionPhase::Moderating {
            log::info!("⏭️ Discarding stale moderation result (generation {})", ticket.generation);
            return false;
        }

        match result {
            Ok(moderation) if moderation.is_food => {
                self.moderation = Some(moderation);
                self.phase = SessionPhase::ImageAccepted;
            }
            Ok(moderation) => {
                self.drop_image();
                self.phase = SessionPhase::Idle;
                self.notice = Some(Notice::warning("Not a Food Image", moderation.prompt));
            }
            Err(e) => {
                self.drop_image();
                self.phase = SessionPhase::Idle;
                self.notice = Some(Notice::error("Moderation Error", format!("Failed to analyze image. {}", e)));
            }
        }
        true
    }

    pub fn clear_image(&mut self) {
        self.supersede();
        self.drop_image();
        self.phase = SessionPhase::Idle;
        self.notice = None;
    }

    pub fn begin_recipe(&mut self) -> Result<(Ticket, RecipeRequest)> {
        let image = match (self.phase, &self.current_image) {
            (SessionPhase::ImageAccepted | SessionPhase::RecipeReady, Some(image)) => image.to_string(),
            _ => {
                return Err(AssistantError::validation(
                    "image",
                    "Please upload a valid food image first.",
                ))
            }
        };

        let ticket = self.supersede();
        self.recipe = None;
        self.phase = SessionPhase::GeneratingRecipe;
        self.notice = None;

        Ok((
            ticket,
            RecipeRequest {
                food_photo_data_uri: image,
                language: Some(self.selected_language.clone()),
            },
        ))
    }

    /// Apply a recipe outcome. Returns false if the ticket was stale.
    pub fn complete_recipe(&mut self, ticket: Ticket, result: Result<RecipeResult>) -> bool {
        if !self.is_current(ticket) || self.phase != SessionPhase::GeneratingRecipe {
            log::info!("⏭️ Discarding stale recipe result (generation {})", ticket.generation);
            return false;
        }

        match result {
            Ok(result) => {
                self.recipe = Some(result.recipe);
                self.phase = SessionPhase::RecipeReady;
            }
            Err(e) => {
                self.phase = SessionPhase::ImageAccepted;
                self.notice = Some(Notice::error(
                    "Recipe Generation Error",
                    format!("Failed to generate recipe. {}", e),
                ));
            }
        }
        true
    }

    fn push_message(&mut self, sender: ChatSender, suffix: &str, text: String) {
        self.next_message_id += 1;
        self.chat_history.push(ChatMessage {
            id: format!("{}_{}", self.next_message_id, suffix),
            sender,
            text,
            created_at: Utc::now(),
        });
    }

    /// Record the user's question and build the request for it.
    pub fn begin_chat(&mut self, question: &str) -> Result<ChatRequest> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::validation("question", "must not be empty"));
        }

        self.push_message(ChatSender::User, "user", question.to_string());
        self.chat_pending += 1;

        Ok(ChatRequest {
            question: question.to_string(),
            recipe: self.recipe.clone(),
            language: Some(self.selected_language.clone()),
        })
    }

    /// Append the answer, or an apology on failure. The phase never changes here.
    pub fn complete_chat(&mut self, result: Result<ChatResult>) {
        self.chat_pending = self.chat_pending.saturating_sub(1);
        match result {
            Ok(result) => self.push_message(ChatSender::Bot, "bot", result.answer),
            Err(e) => {
                self.push_message(ChatSender::Bot, "error", CHAT_APOLOGY.to_string());
                self.notice = Some(Notice::error(
                    "Chat Error",
                    format!("Failed to get response from chatbot. {}", e),
                ));
            }
        }
    }

    pub fn set_language(&mut self, language: &str) {
        self.selected_language = effective_language(Some(language)).to_string();
        self.notice = Some(Notice::info(
            "Language Changed",
            format!("Content language set to {}.", self.selected_language),
        ));
    }

    /// Drop everything tied to the old credential. History and language stay.
    pub fn reset(&mut self) {
        self.clear_image();
        self.notice = Some(Notice::info(
            "API Key Cleared",
            "Please enter an API Key to re-enable features.",
        ));
    }

    pub fn snapshot(&self, api_key_confirmed: bool) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            generation: self.generation,
            current_image: self.current_image.as_ref().map(|i| i.to_string()),
            moderation: self.moderation.clone(),
            recipe: self.recipe.clone(),
            chat_history: self.chat_history.clone(),
            chat_pending: self.chat_pending,
            selected_language: self.selected_language.clone(),
            api_key_confirmed,
            notice: self.notice.clone(),
        }
    }
}

/// Drives a `SessionState` with the assistant and publishes a snapshot after
/// every change. The lock is never held across a model call.
pub struct Session {
    state: Mutex<SessionState>,
    assistant: RecipeAssistant,
    credentials: Credentials,
    updates: watch::Sender<SessionSnapshot>,
}

impl Session {
    pub fn new(assistant: RecipeAssistant, credentials: Credentials, default_language: &str) -> Self {
        let state = SessionState::new(default_language);
        let (updates, _) = watch::channel(state.snapshot(credentials.is_confirmed()));
        Self {
            state: Mutex::new(state),
            assistant,
            credentials,
            updates,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot(self.credentials.is_confirmed())
    }

    /// Sends while the state lock is held so publishes land in mutation order.
    fn publish(&self) -> SessionSnapshot {
        let state = self.state();
        let snapshot = state.snapshot(self.credentials.is_confirmed());
        self.updates.send_replace(snapshot.clone());
        snapshot
    }

    fn require_api_key(&self) -> Result<()> {
        if self.credentials.is_confirmed() {
            Ok(())
        } else {
            Err(AssistantError::transport("No API key has been set for this session"))
        }
    }

    pub async fn submit_image(&self, image: DataUri) -> Result<SessionSnapshot> {
        self.require_api_key()?;

        let request = ModerationRequest { photo_data_uri: image.to_string() };
        let ticket = self.state().begin_upload(image);
        self.publish();
        log::info!("📸 Image submitted, moderating");

        let result = self.assistant.moderate_image(&request).await;
        if let Err(e) = &result {
            log::error!("❌ Moderation failed: {}", e);
        }

        {
            let mut state = self.state();
            if state.complete_moderation(ticket, result) {
                log::info!("🔍 Moderation applied, session is {}", state.phase());
            }
        }
        Ok(self.publish())
    }

    pub fn clear_image(&self) -> SessionSnapshot {
        self.state().clear_image();
        log::info!("🗑️ Image cleared");
        self.publish()
    }

    pub async fn generate_recipe(&self) -> Result<SessionSnapshot> {
        self.require_api_key()?;

        let (ticket, request) = self.state().begin_recipe()?;
        self.publish();

        let result = self.assistant.generate_recipe(&request).await;
        if let Err(e) = &result {
            log::error!("❌ Recipe generation failed: {}", e);
        }

        {
            let mut state = self.state();
            if state.complete_recipe(ticket, result) {
                log::info!("👨‍🍳 Recipe request finished, session is {}", state.phase());
            }
        }
        Ok(self.publish())
    }

    pub async fn send_message(&self, question: &str) -> Result<SessionSnapshot> {
        self.require_api_key()?;

        let request = self.state().begin_chat(question)?;
        self.publish();

        let result = self.assistant.answer_question(&request).await;
        if let Err(e) = &result {
            log::error!("❌ Chat failed: {}", e);
        }

        self.state().complete_chat(result);
        Ok(self.publish())
    }

    pub fn set_language(&self, language: &str) -> SessionSnapshot {
        self.state().set_language(language);
        log::info!("🌐 Language set to {}", self.state().selected_language());
        self.publish()
    }

    pub fn set_api_key(&self, key: &str) -> Result<SessionSnapshot> {
        {
            let mut state = self.state();
            self.credentials.set(key)?;
            state.notice = Some(Notice::info(
                "API Key Set",
                "Your API Key has been acknowledged for this session.",
            ));
        }
        Ok(self.publish())
    }

    pub fn reset_api_key(&self) -> SessionSnapshot {
        {
            let mut state = self.state();
            self.credentials.clear();
            state.reset();
        }
        self.publish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoticeKind;
    use crate::services::assistant::testing::ScriptedAi;
    use serde_json::json;
    use std::sync::Arc;

    const SANDWICH: &str = "data:image/jpeg;base64,c2FuZHdpY2g=";
    const BICYCLE: &str = "data:image/jpeg;base64,YmljeWNsZQ==";

    fn image(raw: &str) -> DataUri {
        DataUri::parse(raw).unwrap()
    }

    fn session(ai: &Arc<ScriptedAi>) -> Arc<Session> {
        Arc::new(Session::new(
            RecipeAssistant::new(ai.clone()),
            Credentials::new(Some("sk-test".to_string())),
            "English",
        ))
    }

    async fn wait_for_calls(ai: &ScriptedAi, n: usize) {
        while ai.call_count() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_sandwich_scenario() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        ai.reply(json!({"recipe": "Sandwich Recipe: bread, ham, mayonnaise"}));
        ai.reply(json!({"answer": "Mashed avocado works well in this sandwich."}));
        let session = session(&ai);

        let snap = session.submit_image(image(SANDWICH)).await.unwrap();
        assert_eq!(snap.phase, SessionPhase::ImageAccepted);
        assert_eq!(snap.current_image.as_deref(), Some(SANDWICH));

        let snap = session.generate_recipe().await.unwrap();
        assert_eq!(snap.phase, SessionPhase::RecipeReady);
        assert_eq!(snap.recipe.as_deref(), Some("Sandwich Recipe: bread, ham, mayonnaise"));

        let snap = session.send_message("what can I use instead of mayonnaise?").await.unwrap();
        assert_eq!(snap.phase, SessionPhase::RecipeReady);
        assert_eq!(snap.chat_history.len(), 2);
        assert_eq!(snap.chat_history[0].sender, ChatSender::User);
        assert_eq!(snap.chat_history[1].text, "Mashed avocado works well in this sandwich.");
        assert_eq!(snap.chat_pending, 0);

        let chat_prompt = ai.last_prompt().unwrap();
        assert!(chat_prompt.instructions.contains("Sandwich Recipe: bread, ham, mayonnaise"));
    }

    #[tokio::test]
    async fn test_bicycle_is_rejected() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": false, "prompt": "Please upload a photo of food."}));
        let session = session(&ai);

        let snap = session.submit_image(image(BICYCLE)).await.unwrap();

        assert_eq!(snap.phase, SessionPhase::Idle);
        assert!(snap.current_image.is_none());
        assert!(snap.moderation.is_none());
        let notice = snap.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.message, "Please upload a photo of food.");
    }

    #[tokio::test]
    async fn test_moderation_failure_discards_image() {
        let ai = ScriptedAi::new();
        ai.fail(AssistantError::transport("OpenRouter API error (429)"));
        let session = session(&ai);

        let snap = session.submit_image(image(SANDWICH)).await.unwrap();

        assert_eq!(snap.phase, SessionPhase::Idle);
        assert!(snap.current_image.is_none());
        assert_eq!(snap.notice.unwrap().title, "Moderation Error");
    }

    #[tokio::test]
    async fn test_newer_upload_supersedes_stale_moderation() {
        let ai = ScriptedAi::new();
        let gate_a = ai.gate();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        let session = session(&ai);

        let pending_a = tokio::spawn({
            let session = session.clone();
            async move { session.submit_image(image(BICYCLE)).await }
        });
        wait_for_calls(&ai, 1).await;
        assert_eq!(session.snapshot().phase, SessionPhase::Moderating);

        let snap_b = session.submit_image(image(SANDWICH)).await.unwrap();
        assert_eq!(snap_b.phase, SessionPhase::ImageAccepted);

        gate_a
            .send(Ok(json!({"isFood": false, "prompt": "Please upload a photo of food."})))
            .unwrap();
        pending_a.await.unwrap().unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::ImageAccepted);
        assert_eq!(snap.current_image.as_deref(), Some(SANDWICH));
        assert!(snap.notice.is_none());
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_recipe() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        let gate = ai.gate();
        let session = session(&ai);
        session.submit_image(image(SANDWICH)).await.unwrap();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.generate_recipe().await }
        });
        wait_for_calls(&ai, 2).await;
        assert_eq!(session.snapshot().phase, SessionPhase::GeneratingRecipe);

        let snap = session.clear_image();
        assert_eq!(snap.phase, SessionPhase::Idle);

        gate.send(Ok(json!({"recipe": "Late recipe"}))).unwrap();
        pending.await.unwrap().unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::Idle);
        assert!(snap.recipe.is_none());
    }

    #[tokio::test]
    async fn test_recipe_failure_returns_to_image_accepted() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        ai.fail(AssistantError::schema("RecipeResult is missing required field 'recipe'"));
        let session = session(&ai);
        session.submit_image(image(SANDWICH)).await.unwrap();

        let snap = session.generate_recipe().await.unwrap();

        assert_eq!(snap.phase, SessionPhase::ImageAccepted);
        assert!(snap.recipe.is_none());
        assert!(snap.current_image.is_some());
        assert_eq!(snap.notice.unwrap().title, "Recipe Generation Error");
    }

    #[tokio::test]
    async fn test_recipe_needs_accepted_image() {
        let ai = ScriptedAi::new();
        let session = session(&ai);

        let err = session.generate_recipe().await.unwrap_err();

        assert_eq!(err.field(), Some("image"));
        assert_eq!(ai.call_count(), 0);
        assert_eq!(session.snapshot().phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_recipe_uses_selected_language() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        ai.reply(json!({"recipe": "சாண்ட்விச்"}));
        let session = session(&ai);
        session.set_language("Tamil");
        session.submit_image(image(SANDWICH)).await.unwrap();

        session.generate_recipe().await.unwrap();

        assert!(ai.last_prompt().unwrap().instructions.contains("Generate the recipe in Tamil."));
    }

    #[tokio::test]
    async fn test_chat_failure_appends_apology() {
        let ai = ScriptedAi::new();
        ai.fail(AssistantError::transport("OpenRouter API error (401 Unauthorized)"));
        let session = session(&ai);

        let snap = session.send_message("How long should I boil eggs?").await.unwrap();

        assert_eq!(snap.phase, SessionPhase::Idle);
        assert_eq!(snap.chat_history.len(), 2);
        assert_eq!(snap.chat_history[1].sender, ChatSender::Bot);
        assert_eq!(snap.chat_history[1].text, CHAT_APOLOGY);
        assert!(snap.chat_history[1].id.ends_with("_error"));
        assert_eq!(snap.notice.unwrap().title, "Chat Error");
    }

    #[tokio::test]
    async fn test_blank_question_appends_nothing() {
        let ai = ScriptedAi::new();
        let session = session(&ai);

        let err = session.send_message("   ").await.unwrap_err();

        assert_eq!(err.field(), Some("question"));
        assert!(session.snapshot().chat_history.is_empty());
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn test_identical_questions_are_two_calls() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"answer": "About 10 minutes."}));
        ai.reply(json!({"answer": "About 10 minutes."}));
        let session = session(&ai);

        session.send_message("How long?").await.unwrap();
        let snap = session.send_message("How long?").await.unwrap();

        assert_eq!(ai.call_count(), 2);
        assert_eq!(snap.chat_history.len(), 4);
        let ids: Vec<_> = snap.chat_history.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec!["1_user", "2_bot", "3_user", "4_bot"]);
    }

    #[tokio::test]
    async fn test_language_change_keeps_history() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"answer": "Yes."}));
        ai.reply(json!({"answer": "Oui."}));
        let session = session(&ai);
        session.send_message("Can I freeze it?").await.unwrap();

        let snap = session.set_language("French");
        assert_eq!(snap.selected_language, "French");
        assert_eq!(snap.chat_history.len(), 2);
        assert_eq!(snap.chat_history[1].text, "Yes.");
        assert_eq!(snap.phase, SessionPhase::Idle);

        session.send_message("Can I freeze it?").await.unwrap();
        assert!(ai.last_prompt().unwrap().instructions.contains("Respond in French."));

        assert_eq!(session.set_language("  ").selected_language, "English");
    }

    #[tokio::test]
    async fn test_reset_api_key() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        let session = session(&ai);
        session.set_language("Hindi");
        session.submit_image(image(SANDWICH)).await.unwrap();

        let snap = session.reset_api_key();
        assert_eq!(snap.phase, SessionPhase::Idle);
        assert!(snap.current_image.is_none());
        assert!(!snap.api_key_confirmed);
        assert_eq!(snap.selected_language, "Hindi");

        let err = session.submit_image(image(SANDWICH)).await.unwrap_err();
        assert!(matches!(err, AssistantError::Transport(_)));
        assert_eq!(ai.call_count(), 1);

        let snap = session.set_api_key("sk-new").unwrap();
        assert!(snap.api_key_confirmed);
        assert_eq!(snap.notice.unwrap().title, "API Key Set");
    }

    #[tokio::test]
    async fn test_subscribers_see_in_flight_phase() {
        let ai = ScriptedAi::new();
        let gate = ai.gate();
        let session = session(&ai);
        let updates = session.subscribe();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.submit_image(image(SANDWICH)).await }
        });
        wait_for_calls(&ai, 1).await;
        assert_eq!(updates.borrow().phase, SessionPhase::Moderating);

        gate.send(Ok(json!({"isFood": true, "prompt": ""}))).unwrap();
        pending.await.unwrap().unwrap();
        assert_eq!(updates.borrow().phase, SessionPhase::ImageAccepted);
    }

    #[tokio::test]
    async fn test_regenerate_clears_old_recipe_first() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        ai.reply(json!({"recipe": "First recipe"}));
        let gate = ai.gate();
        let session = session(&ai);
        session.submit_image(image(SANDWICH)).await.unwrap();
        let snap = session.generate_recipe().await.unwrap();
        assert_eq!(snap.recipe.as_deref(), Some("First recipe"));

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.generate_recipe().await }
        });
        wait_for_calls(&ai, 3).await;
        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::GeneratingRecipe);
        assert!(snap.recipe.is_none());

        gate.send(Ok(json!({"recipe": "Second recipe"}))).unwrap();
        let snap = pending.await.unwrap().unwrap();
        assert_eq!(snap.phase, SessionPhase::RecipeReady);
        assert_eq!(snap.recipe.as_deref(), Some("Second recipe"));
    }

    #[tokio::test]
    async fn test_new_upload_discards_in_flight_recipe() {
        let ai = ScriptedAi::new();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        let gate = ai.gate();
        ai.reply(json!({"isFood": true, "prompt": ""}));
        let session = session(&ai);
        session.submit_image(image(BICYCLE)).await.unwrap();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.generate_recipe().await }
        });
        wait_for_calls(&ai, 2).await;

        let snap = session.submit_image(image(SANDWICH)).await.unwrap();
        assert_eq!(snap.phase, SessionPhase::ImageAccepted);

        gate.send(Ok(json!({"recipe": "Recipe for the old photo"}))).unwrap();
        pending.await.unwrap().unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::ImageAccepted);
        assert_eq!(snap.current_image.as_deref(), Some(SANDWICH));
        assert!(snap.recipe.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_published_snapshot_tracks_latest_state() {
        let session = session(&ScriptedAi::new());
        let updates = session.subscribe();

        for round in 0..200 {
            let tasks: Vec<_> = (0..32)
                .map(|i| {
                    let session = session.clone();
                    tokio::spawn(async move {
                        session.set_language(&format!("L{}", i));
                    })
                })
                .collect();
            for task in tasks {
                task.await.unwrap();
            }

            let published = updates.borrow().selected_language.clone();
            assert_eq!(published, session.snapshot().selected_language, "round {}", round);
        }
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut state = SessionState::new("English");
        let first = state.begin_upload(image(BICYCLE));
        let second = state.begin_upload(image(SANDWICH));

        assert!(!state.complete_moderation(first, Ok(ModerationResult { is_food: false, prompt: "No".into() })));
        assert_eq!(state.phase(), SessionPhase::Moderating);

        assert!(state.complete_moderation(second, Ok(ModerationResult { is_food: true, prompt: String::new() })));
        assert_eq!(state.phase(), SessionPhase::ImageAccepted);
    }
}
