use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::models::{CleanedLineItem, GeminiExtraction};

/// 审计提示词: 要求模型只输出 JSON
const SYSTEM_PROMPT: &str = r#"You are an expert medical billing auditor. Given OCR text, return JSON with:
- "individualLineItems": array of { description, amount, quantity?, code? }
- "subTotals": object with keys per category (e.g. PROCEDURES, MEDICATIONS)
- "finalTotal": number that equals the sum of line items minus discounts.
You must obey JSON output with no extra commentary."#;

/// generateContent 请求体
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    text: String,
}

/// generateContent 响应体 (只取候选文本)
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

/// Gemini 汇总客户端
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: &GeminiConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
        }
    }

    /// 汇总全文: OCR 文本 + 回退明细一起交给模型, 要求输出结构化 JSON
    pub async fn summarize(
        &self,
        combined_text: &str,
        fallback_items: &[CleanedLineItem],
    ) -> Result<GeminiExtraction, Box<dyn std::error::Error + Send + Sync>> {
        let Some(api_key) = &self.api_key else {
            return Err("Gemini API key missing".into());
        };

        tracing::info!(
            "[Gemini] 构建提示词: model={}, 文本 {} 字符, 回退明细 {} 条",
            self.model,
            combined_text.len(),
            fallback_items.len()
        );
        let prompt = build_prompt(combined_text, fallback_items)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![TextPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Gemini request failed: {} {}", status.as_u16(), body).into());
        }

        let payload = response.json::<GenerateContentResponse>().await?;
        tracing::info!("[Gemini] 收到响应");
        let text = candidate_text(&payload)
            .ok_or_else(|| "Gemini returned no candidates".to_string())?;

        parse_extraction(&text)
    }
}

/// 拼接提示词: 系统指令 + OCR 原文 + 回退结构化明细
fn build_prompt(
    combined_text: &str,
    fallback_items: &[CleanedLineItem],
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let fallback_json = serde_json::to_string_pretty(fallback_items)?;
    Ok(format!(
        "{SYSTEM_PROMPT}\n\nOCR TEXT:\n\"\"\"\n{combined_text}\n\"\"\"\n\nFALLBACK STRUCTURED LINE ITEMS:\n{fallback_json}\n"
    ))
}

/// 把候选的所有文本片段拼成一段
fn candidate_text(response: &GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    if candidate.content.parts.is_empty() {
        return None;
    }
    Some(
        candidate
            .content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect::<String>(),
    )
}

/// 解析模型输出, 失败时把原文带进错误里方便排查
fn parse_extraction(
    text: &str,
) -> Result<GeminiExtraction, Box<dyn std::error::Error + Send + Sync>> {
    let json = extract_json(text);
    match serde_json::from_str::<GeminiExtraction>(&json) {
        Ok(parsed) => {
            tracing::info!(
                "[Gemini] JSON 解析成功: {} 条明细, finalTotal={}",
                parsed.individual_line_items.len(),
                parsed.final_total
            );
            Ok(parsed)
        }
        Err(error) => {
            tracing::warn!("[Gemini] JSON 解析失败: {}", error);
            Err(format!(
                "Gemini did not return valid JSON. Raw response: {text}. {error}"
            )
            .into())
        }
    }
}

/// 剥掉 markdown 代码栅栏, 再退回到找最外层花括号
fn extract_json(text: &str) -> String {
    let text = text.trim();

    if text.starts_with("```") {
        if let Some(start) = text.find('\n') {
            let after_first_line = &text[start + 1..];
            if let Some(end) = after_first_line.rfind("```") {
                return after_first_line[..end].trim().to_string();
            }
        }
    }

    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            // 末个 } 在首个 { 之前时没有对象区间, 原样返回交给解析报错
            if start < end {
                return text[start..=end].to_string();
            }
        }
    }

    text.to_string()
}
