use burn::{
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, GradientsParams, Optimizer, SgdConfig},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Int, Tensor,
    },
};
use tracing::info;

use crate::{
    data::ImageBatch,
    error::WrnResult,
    model::{WideResNet, WideResNetConfig},
    training::{
        loss::{categorical_cross_entropy, count_correct},
        metrics::{MetricsAccumulator, StepOutput},
    },
};

impl WideResNetConfig {
    /// Builds the network and attaches SGD, categorical cross-entropy and an
    /// accuracy metric
    pub fn compile<B: AutodiffBackend>(
        &self,
        device: &B::Device,
    ) -> WrnResult<CompiledWideResNet<B, impl Optimizer<WideResNet<B>, B>>> {
        let model = self.init::<B>(device)?;

        let momentum = MomentumConfig::new()
            .with_momentum(self.momentum)
            .with_dampening(0.0)
            .with_nesterov(false);
        let optimizer = SgdConfig::new()
            .with_momentum(Some(momentum))
            .init::<B, WideResNet<B>>();

        info!(
            learning_rate = self.learning_rate,
            momentum = self.momentum,
            weight_decay = self.weight_decay,
            "compiled with SGD and categorical cross-entropy"
        );

        Ok(CompiledWideResNet {
            model,
            optimizer,
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
            metrics: MetricsAccumulator::new(),
        })
    }
}

/// A network ready for training: model, optimizer, loss and accuracy metric
///
/// The caller drives training one batch at a time; the learning rate can be
/// changed between epochs through a [`LearningRateScheduler`].
///
/// [`LearningRateScheduler`]: crate::training::LearningRateScheduler
pub struct CompiledWideResNet<B: AutodiffBackend, O> {
    model: WideResNet<B>,
    optimizer: O,
    learning_rate: f64,
    weight_decay: f64,
    metrics: MetricsAccumulator,
}

impl<B, O> CompiledWideResNet<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<WideResNet<B>, B>,
{
    /// Total loss: cross-entropy plus the L2 penalty on every kernel
    fn loss<C: Backend>(
        &self,
        model: &WideResNet<C>,
        logits: Tensor<C, 2>,
        targets: Tensor<C, 1, Int>,
    ) -> Tensor<C, 1> {
        categorical_cross_entropy(logits, targets)
            + model.regularization_penalty().mul_scalar(self.weight_decay)
    }

    /// One forward/backward pass and one optimizer step on `batch`
    pub fn train_step(&mut self, batch: ImageBatch<B>) -> StepOutput {
        let batch_size = batch.targets.dims()[0];

        let logits = self.model.forward_logits(batch.images);
        let loss = self.loss(&self.model, logits.clone(), batch.targets.clone());

        let loss_value: f64 = loss.clone().into_scalar().elem();
        let correct = count_correct(logits.inner(), batch.targets.inner());

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optimizer
            .step(self.learning_rate, self.model.clone(), grads);

        let output = StepOutput {
            loss: loss_value,
            correct,
            total: batch_size,
        };
        self.metrics.record(&output);
        output
    }

    /// Loss and accuracy without updating weights (dropout off, running BN statistics)
    pub fn evaluate(&self, batch: ImageBatch<B::InnerBackend>) -> StepOutput {
        let batch_size = batch.targets.dims()[0];
        let model = self.model.valid();

        let logits = model.forward_logits(batch.images);
        let loss = self.loss(&model, logits.clone(), batch.targets.clone());
        let loss_value: f64 = loss.into_scalar().elem();

        StepOutput {
            loss: loss_value,
            correct: count_correct(logits, batch.targets),
            total: batch_size,
        }
    }

    /// Class probabilities for `images`: [batch, classes]
    pub fn predict(
        &self,
        images: Tensor<B::InnerBackend, 4>,
    ) -> Tensor<B::InnerBackend, 2> {
        self.model.valid().forward(images)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    /// Training loss and accuracy accumulated since the last reset
    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = MetricsAccumulator::new();
    }

    pub fn model(&self) -> &WideResNet<B> {
        &self.model
    }

    pub fn into_model(self) -> WideResNet<B> {
        self.model
    }
}
