use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use suraksha_setu::config::{ServerConfig, TriageConfig};
use suraksha_setu::llm::{InferenceClient, LlmConfig, create_provider};
use suraksha_setu::pipeline::TriagePipeline;
use suraksha_setu::reports::{MediaStore, report_routes};
use suraksha_setu::store::{IncidentStore, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let server_config = ServerConfig::from_env();

    // Initialize tracing; the guard must outlive the server.
    let _log_guard = init_tracing(&server_config);

    let llm_config = LlmConfig::from_env().context("LLM configuration")?;
    let triage_config = TriageConfig::from_env();

    eprintln!("🛟 Suraksha Setu v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   Inference timeout: {:?}", triage_config.inference_timeout);
    eprintln!("   Report API: http://0.0.0.0:{}/report/", server_config.port);
    eprintln!("   Reports: http://0.0.0.0:{}/reports/", server_config.port);

    // Create LLM provider
    let llm = create_provider(&llm_config, triage_config.inference_timeout)?;
    let client = InferenceClient::new(llm, triage_config.inference_timeout);
    let pipeline = Arc::new(TriagePipeline::new(client, &triage_config));

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn IncidentStore> = Arc::new(
        LibSqlBackend::new_local(&server_config.db_path)
            .await
            .with_context(|| format!("opening database at {}", server_config.db_path.display()))?,
    );
    eprintln!("   Database: {}", server_config.db_path.display());

    let media = MediaStore::new(&server_config.upload_dir);
    eprintln!("   Uploads: {}", server_config.upload_dir.display());

    let app = report_routes(pipeline, store, media);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server_config.port))
        .await
        .with_context(|| format!("binding port {}", server_config.port))?;
    tracing::info!(port = server_config.port, "Suraksha Setu listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Stderr logging, plus a daily-rotated file when a log directory is set.
fn init_tracing(config: &ServerConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "suraksha-setu.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}
