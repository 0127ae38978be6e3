pub mod api;
pub mod clients;
pub mod config;
pub mod models;
pub mod service;

pub use clients::{GeminiClient, PaddleClient, PdfRasterizer};
pub use config::AppConfig;
pub use service::ExtractionService;
