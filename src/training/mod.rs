pub mod checkpoint;
pub mod compiled;
pub mod loss;
pub mod metrics;
pub mod schedule;

pub use checkpoint::{load_checkpoint, save_checkpoint};
pub use compiled::CompiledWideResNet;
pub use loss::{categorical_cross_entropy, count_correct};
pub use metrics::{MetricsAccumulator, StepOutput};
pub use schedule::{lr_schedule, LearningRateScheduler, LrSchedule, StepSchedule};
