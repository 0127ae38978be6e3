use reqwest::multipart;
use std::time::Duration;

use crate::config::PaddleConfig;
use crate::models::{PageImage, PaddleOcrResponse};

/// 健康探测超时
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// PaddleOCR 服务客户端
#[derive(Debug, Clone)]
pub struct PaddleClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    health_endpoint: Option<String>,
}

impl PaddleClient {
    pub fn new(http: reqwest::Client, config: &PaddleConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            health_endpoint: config.health_endpoint.clone(),
        }
    }

    /// 单页识别: multipart 上传 page-N.png, 带可选 Bearer 鉴权
    pub async fn run_ocr(
        &self,
        image: &PageImage,
    ) -> Result<PaddleOcrResponse, Box<dyn std::error::Error + Send + Sync>> {
        let Some(endpoint) = &self.endpoint else {
            return Err("Paddle OCR endpoint is missing".into());
        };

        tracing::info!("[Paddle] 上传第 {} 页 ({})", image.page, image.mime_type);
        let part = multipart::Part::bytes(image.data.clone())
            .file_name(format!("page-{}.png", image.page))
            .mime_str(&image.mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.http.post(endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            tracing::warn!("[Paddle] 请求失败: {} {}", status, reason);
            return Err(format!("Paddle OCR failed: {} {}", status.as_u16(), reason).into());
        }

        let payload = response.json::<PaddleOcrResponse>().await?;
        tracing::info!(
            "[Paddle] 响应解析完成: 置信度 {}, {} 行",
            payload.confidence,
            payload.lines.len()
        );
        Ok(payload)
    }

    /// 探测 OCR 服务健康端点
    /// 未配置时报 "unknown", 可达报 "ok", 其余带上错误
    pub async fn health_status(&self) -> String {
        let Some(endpoint) = &self.health_endpoint else {
            return "unknown".to_string();
        };

        let result =
            tokio::time::timeout(HEALTH_CHECK_TIMEOUT, self.http.get(endpoint).send()).await;

        match result {
            Ok(Ok(response)) if response.status().is_success() => "ok".to_string(),
            Ok(Ok(response)) => format!("error:{}", response.status().as_u16()),
            Ok(Err(e)) => format!("error:{}", e),
            Err(_) => "error:timed out".to_string(),
        }
    }
}
