pub mod blocks;
pub mod config;
pub mod layers;
pub mod stage;
pub mod wide_resnet;

// Re-export the main types needed by other modules
pub use config::{DataFormat, StagePlan, WideResNetConfig};
pub use wide_resnet::WideResNet;
