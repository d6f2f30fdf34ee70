// Image classification against a hosted vision model.

pub mod api;
pub mod batch;
pub mod models;

pub use api::VisionClient;
pub use batch::{list_images, run_batch, save_results, Analyzer, SavedResults, Summary};
pub use models::{AnalysisRecord, Usage};
