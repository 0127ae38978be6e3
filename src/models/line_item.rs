use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 清洗后的费用明细行
/// 解析产物和合并产物共用同一结构, 合并只是把同 key 的行叠加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedLineItem {
    pub description: String,
    pub amount: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// 文档级汇总: OCR 侧独立算出的回退合计与平均置信度
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub fallback_total: BigDecimal,
    /// 无任何页面时缺失
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_confidence: Option<f64>,
}
