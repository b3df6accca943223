use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;
use waste_watch_server::{
    api, create_pool, ensure_schema, AppConfig, GeminiClient, MenuService, PgWasteStore,
    SummaryService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;
    ensure_schema(&pool).await?;
    info!("Database pool created");

    if config.summarizer.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, /api/summary will be unavailable");
    }
    let summarizer = Arc::new(GeminiClient::from_config(&config.summarizer)?);

    // 服务
    let store = Arc::new(PgWasteStore::new(pool.clone()));
    let summary_service = Arc::new(SummaryService::new(store.clone(), summarizer));
    let menu_service = Arc::new(MenuService::new(store));

    let app = api::router(api::AppState::new(summary_service, menu_service));

    // 启动服务器
    let addr = config.listen_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/waste-summary   - waste summary (menu_id, scope)");
    info!("  GET  /api/summary         - narrative summary");
    info!("  *    /api/menus           - menu CRUD");
    info!("  *    /listing, /items     - scans and waste detections");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Closing database pool...");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
