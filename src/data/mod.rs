pub mod batcher;
pub mod dataset;

pub use batcher::{ImageBatch, ImageBatcher};
pub use dataset::{ImageDataset, ImageItem};
