use serde::Serialize;

/// Loss and accuracy of a single batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepOutput {
    /// Cross-entropy plus the weight-decay penalty
    pub loss: f64,
    pub correct: usize,
    pub total: usize,
}

impl StepOutput {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

/// Running loss and accuracy over the batches seen since the last reset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsAccumulator {
    total_loss: f64,
    correct: usize,
    total: usize,
    num_batches: usize,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: &StepOutput) {
        self.total_loss += step.loss;
        self.correct += step.correct;
        self.total += step.total;
        self.num_batches += 1;
    }

    pub fn avg_loss(&self) -> f64 {
        if self.num_batches == 0 {
            return 0.0;
        }
        self.total_loss / self.num_batches as f64
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }

    pub fn num_batches(&self) -> usize {
        self.num_batches
    }
}
