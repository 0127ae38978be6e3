pub mod cleaner;
pub mod extraction;
pub mod reconcile;

pub use extraction::ExtractionService;
