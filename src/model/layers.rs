use burn::{
    module::{Module, Param},
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Initializer, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Weight given to the previous moving statistics at each batch-norm update
pub const NORM_MOMENTUM: f64 = 0.1;
pub const NORM_EPSILON: f64 = 1e-5;
/// Bounds of the uniform batch-norm scale initializer
pub const GAMMA_INIT_RANGE: f64 = 0.05;

fn he_normal() -> Initializer {
    Initializer::KaimingNormal {
        gain: std::f64::consts::SQRT_2,
        fan_out_only: false,
    }
}

/// Bias-free 3x3 convolution padded so that the output is `ceil(input / stride)`
pub fn conv3x3<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    stride: usize,
    device: &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new([in_channels, out_channels], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .with_initializer(he_normal())
        .init(device)
}

/// Bias-free 1x1 projection used on expansion shortcuts
pub fn conv1x1<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    stride: usize,
    device: &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new([in_channels, out_channels], [1, 1])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Valid)
        .with_bias(false)
        .with_initializer(he_normal())
        .init(device)
}

/// Squared L2 norm of a kernel, the quantity the weight decay scales
pub fn kernel_penalty<B: Backend, const D: usize>(weight: &Param<Tensor<B, D>>) -> Tensor<B, 1> {
    weight.val().powf_scalar(2.0).sum()
}

/// Short `conv3x3 16->32 stride 2` description of a convolution
pub fn describe_conv<B: Backend>(conv: &Conv2d<B>, stride: usize) -> String {
    let [out_channels, in_channels, kh, kw] = conv.weight.val().dims();
    format!("conv{kh}x{kw} {in_channels}->{out_channels} stride {stride}")
}

/// Configuration for a batch normalization followed by ReLU
#[derive(Debug, Clone)]
pub struct NormReluConfig {
    pub channels: usize,
}

impl NormReluConfig {
    pub fn new(channels: usize) -> Self {
        Self { channels }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> NormRelu<B> {
        // burn weighs the incoming batch statistics by `momentum`
        let mut norm: BatchNorm<B, 2> = BatchNormConfig::new(self.channels)
            .with_momentum(1.0 - NORM_MOMENTUM)
            .with_epsilon(NORM_EPSILON)
            .init(device);
        norm.gamma = Initializer::Uniform {
            min: -GAMMA_INIT_RANGE,
            max: GAMMA_INIT_RANGE,
        }
        .init([self.channels], device);

        NormRelu {
            norm,
            activation: Relu::new(),
            channels: self.channels,
        }
    }
}

/// Batch normalization over the channel dimension, then ReLU
#[derive(Module, Debug)]
pub struct NormRelu<B: Backend> {
    norm: BatchNorm<B, 2>,
    activation: Relu,
    channels: usize,
}

impl<B: Backend> NormRelu<B> {
    /// x: [batch, channels, h, w] -> [batch, channels, h, w]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.norm.forward(x);
        self.activation.forward(x)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}
