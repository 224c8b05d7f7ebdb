mod config;
mod error;
mod handlers;
mod models;
#[cfg(feature = "web-server")]
mod server; // HTTP API for the browser front-end
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use config::Config;
use handlers::Session;
use services::{Credentials, OpenRouterService, RecipeAssistant};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting Recipe Snap...");

    let config = Config::from_env()?;

    let credentials = Credentials::new(config.api_key.clone());
    if credentials.is_confirmed() {
        log::info!("🔑 API key pre-seeded from OPENROUTER_API_KEY");
    } else {
        log::warn!("⚠️ No API key set, waiting for one via PUT /api/key");
    }

    let openrouter = Arc::new(OpenRouterService::new(
        credentials.clone(),
        config.model.clone(),
        config.base_url.clone(),
        config.request_timeout,
    )?
    .with_max_tokens(config.max_tokens));
    log::info!(
        "✅ OpenRouter service initialized with model: {} ({})",
        openrouter.model(),
        config.base_url
    );

    let assistant = RecipeAssistant::new(openrouter);
    let session = Arc::new(Session::new(
        assistant.clone(),
        credentials.clone(),
        &config.default_language,
    ));
    log::info!("✅ Session initialized (language: {})", config.default_language);

    // Log phase transitions
    let mut updates = session.subscribe();
    tokio::spawn(async move {
        let mut last_phase = updates.borrow().phase;
        while updates.changed().await.is_ok() {
            let phase = updates.borrow().phase;
            if phase != last_phase {
                log::info!("🔄 Session phase: {} -> {}", last_phase, phase);
                last_phase = phase;
            }
        }
    });

    #[cfg(feature = "web-server")]
    {
        use server::{create_router, AppState};

        let app = create_router(Arc::new(AppState {
            session: session.clone(),
            assistant,
            credentials,
        }));

        let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
        log::info!("🌐 HTTP server listening on {}", config.bind_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("❌ HTTP server stopped: {}", e);
            }
        });
    }

    #[cfg(not(feature = "web-server"))]
    {
        let _ = (assistant, credentials);
        log::warn!("⚠️ Built without the web-server feature, no front-end API is exposed");
    }

    log::info!("🎉 Recipe Snap is ready!");

    // Keep running
    tokio::signal::ctrl_c().await?;

    log::info!("🛑 Shutting down...");

    Ok(())
}
