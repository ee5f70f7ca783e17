use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use canvas_coach::config::{self, CoachConfig};
use canvas_coach::engine::TurnEngine;
use canvas_coach::llm::create_provider;
use canvas_coach::routes::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // Optional daily-rolling file log next to the stderr output.
    let _log_guard = match std::env::var("CANVAS_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "canvas-coach.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
            None
        }
    };

    let llm_config = config::llm_config_from_env()?;
    let provider = create_provider(&llm_config)?;
    let coach_config = CoachConfig::from_env()?;
    let port = config::server_port()?;

    eprintln!("Canvas Coach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({})", llm_config.model, llm_config.backend.as_str());
    eprintln!("   Turn API: http://0.0.0.0:{port}/api/turn");
    eprintln!("   Registry: http://0.0.0.0:{port}/api/registry");
    if let Some(dir) = &coach_config.session_log_dir {
        eprintln!("   Session reports: {}", dir.display());
    }

    let engine = Arc::new(TurnEngine::new(provider, coach_config));
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(port, "turn server started");
    axum::serve(listener, app).await?;

    Ok(())
}
