use chrono::Utc;
use std::time::Instant;

use crate::clients::{GeminiClient, PaddleClient, PdfRasterizer};
use crate::models::{FallbackSummary, PaddleOcrResponse, ProcessReport, Telemetry};
use crate::service::{cleaner, reconcile};

/// 提取服务: 渲染 -> 逐页 OCR -> 清洗合并 -> LLM 汇总 -> 对账
pub struct ExtractionService {
    rasterizer: PdfRasterizer,
    paddle: PaddleClient,
    gemini: GeminiClient,
}

impl ExtractionService {
    pub fn new(rasterizer: PdfRasterizer, paddle: PaddleClient, gemini: GeminiClient) -> Self {
        Self {
            rasterizer,
            paddle,
            gemini,
        }
    }

    /// 处理一份 PDF, 任一环节失败整个请求失败
    pub async fn process_document(
        &self,
        pdf_bytes: &[u8],
    ) -> Result<ProcessReport, Box<dyn std::error::Error + Send + Sync>> {
        let started = Instant::now();

        // 1. PDF 转页图
        let pages = self.rasterizer.render_pages(pdf_bytes).await?;

        // 2. 逐页 OCR, 顺序执行
        let mut ocr_results: Vec<PaddleOcrResponse> = Vec::with_capacity(pages.len());
        for page in &pages {
            tracing::info!("[Pipeline] 第 {} 页送往 Paddle OCR", page.page);
            let result = self.paddle.run_ocr(page).await?;
            tracing::info!(
                "[Pipeline] 第 {} 页识别完成, 置信度 {}",
                page.page,
                result.confidence
            );
            ocr_results.push(result);
        }

        // 3. 清洗 + 跨页合并
        let cleaned = cleaner::merge_line_items(
            ocr_results
                .iter()
                .flat_map(cleaner::clean_ocr_response)
                .collect(),
        );
        tracing::info!("[Pipeline] 清洗合并后 {} 条明细", cleaned.len());

        // 4. 全文按页拼接后交给 Gemini 汇总
        let combined_text = ocr_results
            .iter()
            .map(|result| result.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let gemini = self.gemini.summarize(&combined_text, &cleaned).await?;
        tracing::info!(
            "[Pipeline] Gemini 汇总完成: {} 条明细, finalTotal={}",
            gemini.individual_line_items.len(),
            gemini.final_total
        );

        // 5. 回退合计与 LLM 合计对账
        let confidences: Vec<f64> = ocr_results.iter().map(|result| result.confidence).collect();
        let totals = reconcile::document_totals(&cleaned, &confidences);
        let reconciliation = reconcile::reconcile(&cleaned, &gemini.final_total);
        tracing::info!(
            "[Pipeline] 回退合计 {}, LLM 合计 {}, 差值 {}",
            reconciliation.fallback_total,
            reconciliation.llm_final_total,
            reconciliation.delta
        );

        tracing::info!("[Pipeline] 处理完成, 耗时 {:?}", started.elapsed());
        Ok(ProcessReport {
            gemini,
            fallback: FallbackSummary {
                line_items: cleaned,
                estimated_total: totals.fallback_total,
            },
            reconciliation,
            telemetry: Telemetry {
                pages: pages.len(),
                paddle_confidence: totals.estimated_confidence,
                processed_at: Utc::now(),
            },
        })
    }

    /// OCR 服务健康状态, 供 /health 透出
    pub async fn paddle_health(&self) -> String {
        self.paddle.health_status().await
    }
}
