//! Jarvis Gateway Server
//! 
//! Serves the chat and image endpoints used by the Jarvis web UI

use anyhow::{Context, Result};
use jarvisgate::config::{LoggingConfig, Settings};
use jarvisgate::{create_router, version_info};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Settings first: logging level and format come from them
    let settings = Settings::new().context("Failed to load server settings")?;
    
    init_logging(&settings.logging)?;
    info!("{}", version_info());
    
    if !settings.has_text_credentials() {
        warn!("No text provider credentials configured; chat will answer with the apology text");
    }
    if settings.image.api_key.is_none() {
        warn!("CLIPDROP_API_KEY not set; image generation will fail");
    }
    
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let app = create_router(settings).await?;
    
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    
    info!("🚀 Jarvis gateway started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("💬 Chat endpoint: http://{}/api/chat", addr);
    info!("🎨 Image endpoint: http://{}/api/generate-image", addr);
    
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;
    
    Ok(())
}

/// Initialize logging system
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if logging.format == "json" {
        // JSON format logs (production environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(logging.level.as_str())
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .finish())
    } else {
        // Human readable format (development environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(logging.level.as_str())
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish())
    };
    
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    
    info!("Logging system initialized");
    Ok(())
}
