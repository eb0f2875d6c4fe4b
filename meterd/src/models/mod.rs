//! Data models for meterd

pub mod measure;

pub use measure::{Measure, MeasureType};
