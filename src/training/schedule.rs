//! Epoch-indexed learning-rate schedules
//!
//! [`lr_schedule`] is the step schedule wide residual networks are trained
//! with. [`LearningRateScheduler`] is the per-epoch hook a training loop calls
//! to push the scheduled rate into a compiled model.

use burn::{optim::Optimizer, tensor::backend::AutodiffBackend};
use tracing::debug;

use crate::{
    error::{WrnError, WrnResult},
    model::WideResNet,
    training::compiled::CompiledWideResNet,
};

/// Epochs at which the wide residual network schedule drops the rate
pub const MILESTONES: [usize; 3] = [60, 120, 160];
/// Rate used before the first milestone and after each one
pub const RATES: [f64; 4] = [0.1, 0.02, 0.004, 0.0008];

/// Learning rate for `epoch` (zero-based)
///
/// ```
/// use wide_resnet::training::lr_schedule;
///
/// assert_eq!(lr_schedule(0), 0.1);
/// assert_eq!(lr_schedule(60), 0.02);
/// assert_eq!(lr_schedule(500), 0.0008);
/// ```
pub fn lr_schedule(epoch: usize) -> f64 {
    if epoch < 60 {
        0.1
    } else if epoch < 120 {
        0.02
    } else if epoch < 160 {
        0.004
    } else {
        0.0008
    }
}

/// Maps an epoch to a learning rate
pub trait LrSchedule {
    fn learning_rate(&self, epoch: usize) -> f64;
}

impl<F: Fn(usize) -> f64> LrSchedule for F {
    fn learning_rate(&self, epoch: usize) -> f64 {
        self(epoch)
    }
}

/// Piecewise-constant schedule: `rates[i]` applies from `milestones[i - 1]`
/// (inclusive) up to `milestones[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchedule {
    milestones: Vec<usize>,
    rates: Vec<f64>,
}

impl StepSchedule {
    pub fn new(milestones: Vec<usize>, rates: Vec<f64>) -> WrnResult<Self> {
        if rates.len() != milestones.len() + 1 {
            return Err(WrnError::invalid(
                "rates",
                rates.len(),
                "need exactly one more rate than milestones",
            ));
        }
        if milestones.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(WrnError::invalid(
                "milestones",
                format!("{milestones:?}"),
                "must be strictly increasing",
            ));
        }
        Ok(Self { milestones, rates })
    }

    /// The same rates as [`lr_schedule`]
    pub fn wide_resnet() -> Self {
        Self {
            milestones: MILESTONES.to_vec(),
            rates: RATES.to_vec(),
        }
    }
}

impl LrSchedule for StepSchedule {
    fn learning_rate(&self, epoch: usize) -> f64 {
        let stage = self.milestones.partition_point(|&milestone| milestone <= epoch);
        self.rates[stage]
    }
}

/// Per-epoch callback applying a schedule to a compiled model
#[derive(Debug, Clone)]
pub struct LearningRateScheduler<S = fn(usize) -> f64> {
    schedule: S,
}

impl Default for LearningRateScheduler {
    fn default() -> Self {
        Self::new(lr_schedule)
    }
}

impl<S: LrSchedule> LearningRateScheduler<S> {
    pub fn new(schedule: S) -> Self {
        Self { schedule }
    }

    pub fn rate(&self, epoch: usize) -> f64 {
        self.schedule.learning_rate(epoch)
    }

    /// Sets the optimizer rate for `epoch` and returns it
    pub fn on_epoch_begin<B, O>(&self, epoch: usize, model: &mut CompiledWideResNet<B, O>) -> f64
    where
        B: AutodiffBackend,
        O: Optimizer<WideResNet<B>, B>,
    {
        let lr = self.rate(epoch);
        model.set_learning_rate(lr);
        debug!(epoch, lr, "learning rate scheduled");
        lr
    }
}
