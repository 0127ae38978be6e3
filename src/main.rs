use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use invoice_ocr_rust::{
    api, AppConfig, ExtractionService, GeminiClient, PaddleClient, PdfRasterizer,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

/// 上传体积上限: 扫描件 PDF 动辄几十 MB
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式 (类似Java格式)
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置 (密钥不进日志)
    let config = AppConfig::from_env();
    info!(
        "Starting server: paddle endpoint {:?}, gemini model {}",
        config.paddle.endpoint, config.gemini.model
    );

    // 创建提取服务, 两个客户端共用一个 HTTP 连接池
    let http = reqwest::Client::new();
    let service = Arc::new(ExtractionService::new(
        PdfRasterizer::new(),
        PaddleClient::new(http.clone(), &config.paddle),
        GeminiClient::new(http, &config.gemini),
    ));

    // 构建路由
    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/process", post(api::process_invoice))
        .with_state(service)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        );

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health       - Health check");
    info!("  POST /api/process  - Invoice PDF extraction");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
