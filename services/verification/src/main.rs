use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use registry_core::tracing::init_tracing;
use registry_verification::config::VerificationConfig;
use registry_verification::jobs::retention::RetentionJob;
use registry_verification::router::build_router;
use registry_verification::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = VerificationConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let policy = config
        .policy()
        .unwrap_or_else(|e| panic!("invalid verification policy: {e}"));

    let state = AppState {
        db: Arc::new(db),
        policy,
    };

    if config.retention_job_enabled {
        RetentionJob {
            registry: state.registry(),
            interval: config.purge_interval(),
        }
        .spawn();
    } else {
        info!("verification retention job disabled");
    }

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.verification_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("verification service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
