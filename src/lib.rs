//! Wide Residual Networks on burn
//!
//! [`WideResNetConfig`] holds the hyperparameters and builds either the bare
//! network ([`WideResNetConfig::init`]) or a compiled, trainable one
//! ([`WideResNetConfig::compile`]). [`training::lr_schedule`] is the
//! epoch-indexed learning-rate schedule these networks are trained with.

pub mod data;
pub mod error;
pub mod logging;
pub mod model;
pub mod training;

pub use error::{WrnError, WrnResult};
pub use model::{DataFormat, WideResNet, WideResNetConfig};
pub use training::{lr_schedule, CompiledWideResNet, LearningRateScheduler};
