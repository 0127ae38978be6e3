use serde::{Deserialize, Serialize};

/// PDF 渲染出的单页图像
#[derive(Debug, Clone)]
pub struct PageImage {
    pub page: u32,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// OCR 识别出的单行文本
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f64,
}

/// PaddleOCR 服务的整页响应 (线上格式 camelCase)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleOcrResponse {
    pub raw_text: String,
    pub confidence: f64,
    pub lines: Vec<OcrLine>,
}
