//! CallTurn HTTP Server
//!
//! Main entry point for the voice webhook server.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use application::{ClipStorePort, TurnController};
use infrastructure::{
    AppConfig, InMemoryClipStore, LlmResponseGenerator, LoggingConfig, MokaSessionStore,
    TtsSpeechSynthesizer, init_logging,
};
use presentation_http::{
    error::set_expose_internal_errors,
    routes,
    shutdown::{drain, shutdown_signal},
    state::AppState,
};
use tokio::{net::TcpListener, sync::Notify};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_logging(&LoggingConfig::from(&config.server))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "CallTurn starting"
    );

    config.validate()?;
    set_expose_internal_errors(!config.is_production());

    if config.telephony.uses_dev_secret() {
        warn!("Webhook secret is the development default, set CALLTURN_TELEPHONY__WEBHOOK_SECRET");
    }

    let generator = LlmResponseGenerator::from_config(config.inference.clone())?;
    let synthesizer = TtsSpeechSynthesizer::from_config(config.speech.clone())?;
    let clips: Arc<dyn ClipStorePort> = Arc::new(InMemoryClipStore::from_config(&config.clips));
    let sessions = Arc::new(MokaSessionStore::from_config(&config.conversation));

    info!(
        model = %config.inference.default_model,
        speech_enabled = synthesizer.is_enabled(),
        max_turns = config.conversation.max_turns,
        public_base_url = %config.telephony.base_url(),
        "Configuration loaded"
    );

    let controller = TurnController::with_config(
        Arc::new(generator),
        Arc::new(synthesizer),
        Arc::clone(&clips),
        sessions,
        config.conversation.controller_config(),
    );
    let state = AppState::new(controller, clips, config.telephony.clone());

    let app = routes::create_router(state)
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server listening on http://{addr}");

    let signalled = Arc::new(Notify::new());
    let trigger = Arc::clone(&signalled);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            trigger.notify_one();
        })
        .into_future();

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    if drain(server, signalled, shutdown_timeout).await? {
        info!("Server shutdown complete");
    } else {
        warn!(
            timeout = ?shutdown_timeout,
            "Connections still open at the shutdown deadline, exiting"
        );
    }

    Ok(())
}
