use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::CleanedLineItem;

/// Gemini 结构化提取结果 (线上格式 camelCase)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiExtraction {
    pub individual_line_items: Vec<CleanedLineItem>,
    /// 分类小计, 保持模型输出的键顺序
    #[serde(default)]
    pub sub_totals: IndexMap<String, BigDecimal>,
    pub final_total: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// OCR 侧独立推导的回退汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackSummary {
    pub line_items: Vec<CleanedLineItem>,
    pub estimated_total: BigDecimal,
}

/// 两路合计的对账结果: delta = LLM 合计 - 回退合计 (保留符号)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsReconciliation {
    pub fallback_total: BigDecimal,
    pub llm_final_total: BigDecimal,
    pub delta: BigDecimal,
}

/// 处理过程遥测
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub pages: usize,
    /// 无任何页面时为 null
    pub paddle_confidence: Option<f64>,
    pub processed_at: DateTime<Utc>,
}

/// /api/process 的成功响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessReport {
    pub gemini: GeminiExtraction,
    pub fallback: FallbackSummary,
    pub reconciliation: TotalsReconciliation,
    pub telemetry: Telemetry,
}
