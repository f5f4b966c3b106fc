use std::sync::Arc;

use notify_orchestrator::api::notification_routes;
use notify_orchestrator::channels::SmtpSender;
use notify_orchestrator::config::{AppConfig, CorsPolicy};
use notify_orchestrator::error::Result;
use notify_orchestrator::service::NotificationService;
use notify_orchestrator::store::{LibSqlBackend, SeedData};

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    eprintln!("📬 Notify Orchestrator v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/notifications", config.port);
    eprintln!(
        "   SMTP: {}:{} (from {})",
        config.smtp.host, config.smtp.port, config.smtp.from_address
    );

    // ── Database ─────────────────────────────────────────────────────────
    let db = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.db_path.display());

    if let Some(seed_path) = &config.seed_path {
        let seed = SeedData::load(seed_path).await?;
        let (rules, templates) = seed.apply(&db).await?;
        eprintln!(
            "   Seed: {} rules, {} templates from {}",
            rules,
            templates,
            seed_path.display()
        );
    }

    // ── Delivery ─────────────────────────────────────────────────────────
    let sender = Arc::new(SmtpSender::new(config.smtp.clone())?);

    if config.whitelist.enabled {
        let count = config
            .whitelist
            .allowed_recipients
            .as_ref()
            .map_or(0, Vec::len);
        eprintln!("   Whitelist: enabled ({} recipients)", count);
        if count == 0 {
            tracing::warn!("Whitelist enabled with no recipients; every send will be refused");
        }
    } else {
        eprintln!("   Whitelist: disabled");
    }

    match &config.cors {
        CorsPolicy::Disabled => eprintln!("   CORS: disabled"),
        CorsPolicy::AnyOrigin => eprintln!("   CORS: any origin"),
        CorsPolicy::Origins(origins) => eprintln!("   CORS: {}", origins.join(", ")),
    }

    let service = NotificationService::new(
        db.clone(),
        db.clone(),
        sender,
        Arc::new(config.whitelist.clone()),
        db,
    );
    let app = notification_routes(service, &config.cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Notification API started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
