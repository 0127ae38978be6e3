use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paddle: PaddleConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// PaddleOCR 服务配置
/// endpoint 缺失时服务照常启动, 请求阶段才报错
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaddleConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub health_endpoint: Option<String>,
}

/// Gemini 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            paddle: PaddleConfig {
                endpoint: std::env::var("PADDLE_OCR_ENDPOINT").ok(),
                api_key: std::env::var("PADDLE_OCR_API_KEY").ok(),
                health_endpoint: std::env::var("PADDLE_OCR_HEALTH_ENDPOINT").ok(),
            },
            gemini: GeminiConfig {
                api_key: std::env::var("GEMINI_API_KEY").ok(),
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-1.5-pro".to_string()),
                api_base: std::env::var("GEMINI_API_BASE")
                    .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            },
        }
    }
}
