pub mod gemini;
pub mod paddle;
pub mod pdf;

pub use gemini::GeminiClient;
pub use paddle::PaddleClient;
pub use pdf::PdfRasterizer;
