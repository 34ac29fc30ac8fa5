mod assets;
mod config;
mod content;
mod cover_letter;
mod docx;
mod errors;
mod format;
mod layout;
mod llm_client;
mod routes;
mod state;
mod tailoring;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assets::{Assets, LetterAssets};
use crate::config::Config;
use crate::content::DraftStore;
use crate::cover_letter::{CoverLetterBuilder, LetterLayout, LetterWriter, LlmLetterWriter};
use crate::format::FormatRebuilder;
use crate::llm_client::LlmClient;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;
use crate::tailoring::{DisabledTransform, LlmTransform, TextTransform};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume tailor v{}", env!("CARGO_PKG_VERSION"));

    // Reference document, format metadata and content template
    let assets = Assets::load(
        &config.reference_docx,
        &config.format_metadata_path,
        &config.content_template_path,
    )?;

    // Glyph metrics and line budget for the reference layout
    let limiter = Arc::new(config.limiter(&assets.metadata.section_properties));

    // Cover letter template, optional
    let letter_assets = LetterAssets::load(&config.cover_letter_docx, &config.cover_letter_metadata_path)?;

    // Text transform and letter writer: LLM when a key is configured
    let (transform, letter_writer): (Arc<dyn TextTransform>, Arc<dyn LetterWriter>) =
        match &config.anthropic_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone(), config.transform_timeout)?;
                info!("LLM client initialized (model: {})", llm_client::MODEL);
                (
                    Arc::new(LlmTransform::new(llm.clone(), config.transform_timeout)),
                    Arc::new(LlmLetterWriter::new(llm, config.transform_timeout)),
                )
            }
            None => {
                warn!("ANTHROPIC_API_KEY is not set; tailoring requests will fail");
                (Arc::new(DisabledTransform), Arc::new(DisabledTransform))
            }
        };

    let cover_letters = letter_assets.map(|letter| {
        CoverLetterBuilder::new(
            FormatRebuilder::new(letter.reference, Arc::new(letter.metadata)).with_drift_policy(config.drift_policy),
            LetterLayout::default(),
        )
    });

    // Build app state
    let state = AppState {
        config: config.clone(),
        limiter,
        rebuilder: FormatRebuilder::new(assets.reference, Arc::new(assets.metadata))
            .with_drift_policy(config.drift_policy),
        seed: Arc::new(assets.seed),
        drafts: DraftStore::new(&config.working_copy_path),
        transform,
        cover_letters,
        letter_writer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origins)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
