pub mod line_item;
pub mod ocr;
pub mod report;

pub use line_item::{CleanedLineItem, DocumentTotals};
pub use ocr::{OcrLine, PaddleOcrResponse, PageImage};
pub use report::{
    FallbackSummary, GeminiExtraction, ProcessReport, Telemetry, TotalsReconciliation,
};
