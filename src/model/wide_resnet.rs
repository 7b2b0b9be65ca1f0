use burn::{
    module::{Ignored, Module},
    nn::{
        conv::Conv2d,
        pool::{AvgPool2d, AvgPool2dConfig},
        Initializer, Linear, LinearConfig,
    },
    tensor::{activation::softmax, backend::Backend, Tensor},
};
use tracing::{debug, info};

use crate::{
    error::WrnResult,
    model::{
        config::{DataFormat, WideResNetConfig, POOL_SIZE, STEM_FILTERS},
        layers::{conv3x3, describe_conv, kernel_penalty, NormRelu, NormReluConfig},
        stage::{Stage, StageConfig},
    },
};

/// Starting value of the depth label before the stages add their convolutions
const DEPTH_LABEL_BASE: usize = 4;

impl WideResNetConfig {
    /// Validates the hyperparameters and builds the network on `device`
    pub fn init<B: Backend>(&self, device: &B::Device) -> WrnResult<WideResNet<B>> {
        self.validate()?;

        // Stem: conv3x3 -> BN -> ReLU on the raw input
        let stem = conv3x3(self.input_channels(), STEM_FILTERS, 1, device);
        let stem_norm = NormReluConfig::new(STEM_FILTERS).init(device);

        // Three stages, each doubling the width of the previous one
        let mut in_channels = STEM_FILTERS;
        let stages: Vec<Stage<B>> = self
            .stage_plan()
            .into_iter()
            .map(|plan| {
                let stage = StageConfig {
                    index: plan.index,
                    in_channels,
                    width: plan.width,
                    stride: plan.stride,
                    blocks: plan.blocks,
                    dropout: self.dropout,
                    data_format: self.data_format,
                }
                .init(device);
                in_channels = plan.width;
                stage
            })
            .collect();

        // Head: fixed 8x8 average pool, flatten, dense classifier
        let pool = AvgPool2dConfig::new([POOL_SIZE, POOL_SIZE])
            .with_strides([POOL_SIZE, POOL_SIZE])
            .init();
        let mut head = LinearConfig::new(self.head_features(), self.nb_classes)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);
        // burn draws the bias from the layer initializer; the classifier starts at zero
        head.bias = Some(Initializer::Zeros.init([self.nb_classes], device));

        let model = WideResNet {
            stem,
            stem_norm,
            stages,
            pool,
            head,
            data_format: Ignored(self.data_format),
            k: self.k,
        };

        debug!(
            head_features = self.head_features(),
            nb_classes = self.nb_classes,
            "built classifier head"
        );
        if self.verbose {
            info!("Wide Residual Network-{}-{} created.", model.depth(), self.k);
        }

        Ok(model)
    }
}

/// Wide residual network from an image batch to class probabilities
#[derive(Module, Debug)]
pub struct WideResNet<B: Backend> {
    stem: Conv2d<B>,
    stem_norm: NormRelu<B>,
    stages: Vec<Stage<B>>,
    pool: AvgPool2d,
    head: Linear<B>,
    data_format: Ignored<DataFormat>,
    k: usize,
}

impl<B: Backend> WideResNet<B> {
    /// Forward pass up to the dense layer
    /// images: [batch, d0, d1, d2] in the configured layout -> logits: [batch, classes]
    pub fn forward_logits(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        // burn normalizes over dim 1, so work channels-first internally
        let x = match self.data_format.0 {
            DataFormat::ChannelsFirst => images,
            DataFormat::ChannelsLast => images.permute([0, 3, 1, 2]),
        };

        let x = self.stem.forward(x);
        let mut x = self.stem_norm.forward(x);

        for stage in &self.stages {
            x = stage.forward(x);
        }

        let x = self.pool.forward(x);
        let x = x.flatten::<2>(1, 3);
        self.head.forward(x)
    }

    /// Class probabilities: [batch, classes], rows sum to one
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward_logits(images), 1)
    }

    /// Sum of squared convolution and dense kernels
    pub fn regularization_penalty(&self) -> Tensor<B, 1> {
        let penalty = kernel_penalty(&self.stem.weight) + kernel_penalty(&self.head.weight);
        self.stages
            .iter()
            .fold(penalty, |acc, stage| acc + stage.l2_penalty())
    }

    /// Depth under the `Wide Residual Network-<depth>-<k>` convention
    pub fn depth(&self) -> usize {
        DEPTH_LABEL_BASE + self.stages.iter().map(Stage::num_convs).sum::<usize>()
    }

    pub fn width_multiplier(&self) -> usize {
        self.k
    }

    pub fn name(&self) -> String {
        format!("Wide Residual Network-{}-{}", self.depth(), self.k)
    }

    pub fn stage_widths(&self) -> Vec<usize> {
        self.stages.iter().map(Stage::width).collect()
    }

    pub fn num_classes(&self) -> usize {
        self.head.weight.val().dims()[1]
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format.0
    }

    /// One line per layer group, read back from the built weights
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            format!("stem: {}", describe_conv(&self.stem, 1)),
            format!("stem.norm: bn+relu {}", self.stem_norm.channels()),
        ];
        for (i, stage) in self.stages.iter().enumerate() {
            stage.describe(i + 1, &mut lines);
        }
        let [features, classes] = self.head.weight.val().dims();
        lines.push(format!(
            "head: avgpool {POOL_SIZE}x{POOL_SIZE}, flatten, dense {features}->{classes}, softmax"
        ));
        lines
    }
}
