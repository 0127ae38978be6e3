use crate::service::ExtractionService;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// 整个处理流程的硬超时
const PROCESS_TIMEOUT: Duration = Duration::from_secs(300);

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// 健康检查响应体
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

/// 各依赖服务的健康状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub app: String,
    pub paddle: String,
}

/// 健康检查: 应用自身 + 下游 OCR 服务
pub async fn health_check(State(service): State<Arc<ExtractionService>>) -> Response {
    let response = HealthResponse {
        status: HealthStatus {
            app: "ok".to_string(),
            paddle: service.paddle_health().await,
        },
        timestamp: Utc::now(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 发票 PDF 处理接口: multipart 上传, 文件放 file 字段
pub async fn process_invoice(
    State(service): State<Arc<ExtractionService>>,
    mut multipart: Multipart,
) -> Response {
    tracing::info!("[API] /api/process 收到请求");

    let pdf_bytes = match read_pdf_field(&mut multipart).await {
        // 空文件按缺文件处理, 同样 400
        Ok(Some(bytes)) if !bytes.is_empty() => bytes,
        Ok(_) | Err(_) => {
            tracing::info!("[API] 请求未带有效 PDF 文件");
            let response = ErrorResponse {
                error: "No PDF file provided".to_string(),
                detail: None,
            };
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };
    tracing::info!("[API] 收到 PDF {} 字节", pdf_bytes.len());

    // 超时控制: 到点直接 500, 不让请求挂死
    let result = tokio::time::timeout(PROCESS_TIMEOUT, service.process_document(&pdf_bytes)).await;

    match result {
        Ok(Ok(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(Err(e)) => {
            tracing::error!("[API] 处理失败: {}", e);
            let response = ErrorResponse {
                error: "Processing failed".to_string(),
                detail: Some(e.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
        Err(_) => {
            tracing::error!("[API] 处理超时 (>{:?})", PROCESS_TIMEOUT);
            let response = ErrorResponse {
                error: "Processing failed".to_string(),
                detail: Some(format!("processing timed out after {:?}", PROCESS_TIMEOUT)),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// 从 multipart 表单里取出 file 字段的字节
async fn read_pdf_field(
    multipart: &mut Multipart,
) -> Result<Option<Vec<u8>>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await?;
            return Ok(Some(bytes.to_vec()));
        }
    }
    Ok(None)
}
