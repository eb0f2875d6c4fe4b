//! External integrations and image staging for meterd

pub mod gemini;
pub mod staging;

pub use gemini::{Extraction, ExtractionError, GeminiExtractor, MeterImageExtractor};
pub use staging::StagedImage;
