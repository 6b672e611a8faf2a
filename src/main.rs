use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_search::{api, bootstrap, config, engine, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_search=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(anyhow::Error::msg)?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    let engine = engine::build_engine(&app_config.engine)?;

    // Ensure catalog indexes in background; the server starts regardless / 后台创建索引，不阻塞启动
    let bootstrap_engine = engine.clone();
    let indexes = app_config.catalog.indexes.clone();
    tokio::spawn(async move {
        let report = bootstrap::ensure_indexes(bootstrap_engine.as_ref(), &indexes).await;
        let failed = report
            .iter()
            .filter(|(_, status)| matches!(status, bootstrap::IndexStatus::Failed(_)))
            .count();
        if failed > 0 {
            tracing::warn!("Index bootstrap finished with {} failed index(es)", failed);
        } else {
            tracing::info!("Index bootstrap finished: {} index(es) ready", report.len());
        }
    });

    let state = Arc::new(AppState::new(engine, &app_config));
    let app = api::build_router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
