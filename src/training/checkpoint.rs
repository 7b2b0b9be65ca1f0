use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};
use tracing::info;

use crate::{
    error::{WrnError, WrnResult},
    model::{WideResNet, WideResNetConfig},
};

/// Hyperparameters, stored as JSON next to the weights
pub const CONFIG_FILE: &str = "config.json";
/// Weights file stem; `CompactRecorder` writes it as `model.mpk`
pub const MODEL_FILE: &str = "model";

/// Writes the hyperparameters and the model weights into `dir`
pub fn save_checkpoint<B: Backend>(
    model: &WideResNet<B>,
    config: &WideResNetConfig,
    dir: impl AsRef<Path>,
) -> WrnResult<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    config.save(dir.join(CONFIG_FILE))?;

    let model_path = dir.join(MODEL_FILE);
    CompactRecorder::new()
        .record(model.clone().into_record(), model_path.clone())
        .map_err(|e| WrnError::Checkpoint(format!("failed to save model: {e:?}")))?;

    info!(dir = %dir.display(), "checkpoint saved");
    Ok(model_path)
}

/// Rebuilds the network described in `dir` and restores its weights
pub fn load_checkpoint<B: Backend>(
    dir: impl AsRef<Path>,
    device: &B::Device,
) -> WrnResult<(WideResNetConfig, WideResNet<B>)> {
    let dir = dir.as_ref();
    let config = WideResNetConfig::load(dir.join(CONFIG_FILE))?;
    let model = config.init::<B>(device)?;

    let record = CompactRecorder::new()
        .load(dir.join(MODEL_FILE), device)
        .map_err(|e| WrnError::Checkpoint(format!("failed to load model: {e:?}")))?;

    info!(dir = %dir.display(), "checkpoint loaded");
    Ok((config, model.load_record(record)))
}
