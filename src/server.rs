use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::AssistantError;
use crate::handlers::Session;
use crate::models::{ChatRequest, DataUri, ModerationRequest, RecipeRequest};
use crate::services::validation::{self, CHAT_INPUT, MODERATION_INPUT, RECIPE_INPUT};
use crate::services::{Credentials, RecipeAssistant};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub session: Arc<Session>,
    pub assistant: RecipeAssistant,
    pub credentials: Credentials,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

struct ApiError(StatusCode, AssistantError);

impl ApiError {
    /// Errors returned by session intents: validation or a missing key
    fn intent(e: AssistantError) -> Self {
        let status = match e {
            AssistantError::Validation { .. } => StatusCode::BAD_REQUEST,
            AssistantError::Transport(_) => StatusCode::UNAUTHORIZED,
            AssistantError::SchemaViolation(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError(status, e)
    }

    /// Errors returned by a direct model call
    fn upstream(e: AssistantError) -> Self {
        let status = match e {
            AssistantError::Validation { .. } => StatusCode::BAD_REQUEST,
            AssistantError::Transport(_) | AssistantError::SchemaViolation(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError(status, e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError(status, e) = self;
        let body = ErrorBody {
            error: e.to_string(),
            field: e.field().map(str::to_string),
        };
        (status, Json(body)).into_response()
    }
}

fn parse_body(body: &Bytes) -> Result<Value, Response> {
    serde_json::from_slice(body).map_err(|e| {
        log::error!("❌ Failed to parse request body: {}", e);
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response()
    })
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/session", get(get_session))
        .route("/api/key", put(set_api_key).delete(reset_api_key))
        .route("/api/image", post(submit_image).delete(clear_image))
        .route("/api/recipe", post(generate_recipe))
        .route("/api/chat", post(send_message))
        .route("/api/language", put(set_language))
        .route("/api/flows/moderate-image", post(moderate_image_flow))
        .route("/api/flows/generate-recipe", post(generate_recipe_flow))
        .route("/api/flows/answer-question", post(answer_question_flow))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "Recipe Snap - snap a food pic, get a recipe, and chat with the AI chef. See /api/session"
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.session.snapshot())
}

#[derive(Deserialize)]
struct ApiKeyBody {
    #[serde(rename = "apiKey")]
    api_key: String,
}

async fn set_api_key(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let body: ApiKeyBody = match parse_body(&body).and_then(|v| {
        serde_json::from_value(v).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())
    }) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match state.session.set_api_key(&body.api_key) {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => ApiError::intent(e).into_response(),
    }
}

async fn reset_api_key(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.session.reset_api_key())
}

/// Accepts raw image bytes (`Content-Type: image/*`) or `{"photoDataUri": "..."}`.
async fn submit_image(State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    log::info!("📸 Image upload: {} ({} bytes)", content_type, body.len());

    let image = if content_type == "application/json" {
        let value = match parse_body(&body) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        validation::request_from_json::<ModerationRequest>(&MODERATION_INPUT, value).and_then(|r| r.validate())
    } else if content_type.starts_with("image/") {
        DataUri::from_bytes(&content_type, &body).map_err(|reason| AssistantError::validation("image", reason))
    } else {
        Err(AssistantError::validation(
            "image",
            "Content-Type must be image/* or application/json",
        ))
    };

    let image = match image {
        Ok(image) => image,
        Err(e) => return ApiError::intent(e).into_response(),
    };

    match state.session.submit_image(image).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => ApiError::intent(e).into_response(),
    }
}

async fn clear_image(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.session.clear_image())
}

async fn generate_recipe(State(state): State<Arc<AppState>>) -> Response {
    match state.session.generate_recipe().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => ApiError::intent(e).into_response(),
    }
}

#[derive(Deserialize)]
struct ChatBody {
    question: String,
}

async fn send_message(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let body: ChatBody = match parse_body(&body).and_then(|v| {
        serde_json::from_value(v).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())
    }) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match state.session.send_message(&body.question).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => ApiError::intent(e).into_response(),
    }
}

#[derive(Deserialize)]
struct LanguageBody {
    language: String,
}

async fn set_language(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let body: LanguageBody = match parse_body(&body).and_then(|v| {
        serde_json::from_value(v).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())
    }) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    Json(state.session.set_language(&body.language)).into_response()
}

fn require_key(state: &AppState) -> Result<(), Response> {
    if state.credentials.is_confirmed() {
        Ok(())
    } else {
        Err(ApiError::intent(AssistantError::transport("No API key has been set for this session")).into_response())
    }
}

// Stateless operations, one model call each, outside the session.

async fn moderate_image_flow(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    if let Err(resp) = require_key(&state) {
        return resp;
    }
    let value = match parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let request: ModerationRequest = match validation::request_from_json(&MODERATION_INPUT, value) {
        Ok(r) => r,
        Err(e) => return ApiError::upstream(e).into_response(),
    };

    match state.assistant.moderate_image(&request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => ApiError::upstream(e).into_response(),
    }
}

async fn generate_recipe_flow(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    if let Err(resp) = require_key(&state) {
        return resp;
    }
    let value = match parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let request: RecipeRequest = match validation::request_from_json(&RECIPE_INPUT, value) {
        Ok(r) => r,
        Err(e) => return ApiError::upstream(e).into_response(),
    };

    match state.assistant.generate_recipe(&request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => ApiError::upstream(e).into_response(),
    }
}

async fn answer_question_flow(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    if let Err(resp) = require_key(&state) {
        return resp;
    }
    let value = match parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let request: ChatRequest = match validation::request_from_json(&CHAT_INPUT, value) {
        Ok(r) => r,
        Err(e) => return ApiError::upstream(e).into_response(),
    };

    match state.assistant.answer_question(&request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => ApiError::upstream(e).into_response(),
    }
}
