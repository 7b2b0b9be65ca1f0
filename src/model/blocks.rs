use burn::{
    module::Module,
    nn::{conv::Conv2d, Dropout, DropoutConfig},
    tensor::{backend::Backend, Tensor},
};

use crate::model::layers::{
    conv1x1, conv3x3, describe_conv, kernel_penalty, NormRelu, NormReluConfig,
};

/// Configuration for the block that opens a stage
#[derive(Debug, Clone)]
pub struct ExpansionBlockConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    pub stride: usize,
}

impl ExpansionBlockConfig {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            stride,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ExpansionBlock<B> {
        ExpansionBlock {
            conv1: conv3x3(self.in_channels, self.out_channels, self.stride, device),
            norm: NormReluConfig::new(self.out_channels).init(device),
            conv2: conv3x3(self.out_channels, self.out_channels, 1, device),
            shortcut: conv1x1(self.in_channels, self.out_channels, self.stride, device),
            stride: self.stride,
        }
    }
}

/// Residual block that changes width and resolution:
/// x -> conv3x3/s -> BN -> ReLU -> conv3x3 -> (+ conv1x1/s(x))
///
/// No activation follows the sum; the next block normalizes first.
#[derive(Module, Debug)]
pub struct ExpansionBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm: NormRelu<B>,
    conv2: Conv2d<B>,
    shortcut: Conv2d<B>,
    stride: usize,
}

impl<B: Backend> ExpansionBlock<B> {
    /// x: [batch, in, h, w] -> [batch, out, ceil(h / s), ceil(w / s)]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let skip = self.shortcut.forward(x.clone());

        let x = self.conv1.forward(x);
        let x = self.norm.forward(x);
        let x = self.conv2.forward(x);

        x + skip
    }

    pub fn out_channels(&self) -> usize {
        self.norm.channels()
    }

    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        kernel_penalty(&self.conv1.weight)
            + kernel_penalty(&self.conv2.weight)
            + kernel_penalty(&self.shortcut.weight)
    }

    pub fn describe(&self) -> String {
        format!(
            "{}, bn+relu, {}, shortcut {}",
            describe_conv(&self.conv1, self.stride),
            describe_conv(&self.conv2, 1),
            describe_conv(&self.shortcut, self.stride),
        )
    }
}

/// Configuration for a width-preserving residual block
#[derive(Debug, Clone)]
pub struct IdentityBlockConfig {
    pub channels: usize,
    pub dropout: f64,
}

impl IdentityBlockConfig {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            dropout: 0.0,
        }
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> IdentityBlock<B> {
        let dropout = (self.dropout > 0.0).then(|| DropoutConfig::new(self.dropout).init());

        IdentityBlock {
            norm1: NormReluConfig::new(self.channels).init(device),
            conv1: conv3x3(self.channels, self.channels, 1, device),
            dropout,
            norm2: NormReluConfig::new(self.channels).init(device),
            conv2: conv3x3(self.channels, self.channels, 1, device),
        }
    }
}

/// Pre-activation residual unit with an identity shortcut:
/// x -> BN -> ReLU -> conv3x3 -> [dropout] -> BN -> ReLU -> conv3x3 -> (+ x)
#[derive(Module, Debug)]
pub struct IdentityBlock<B: Backend> {
    norm1: NormRelu<B>,
    conv1: Conv2d<B>,
    dropout: Option<Dropout>,
    norm2: NormRelu<B>,
    conv2: Conv2d<B>,
}

impl<B: Backend> IdentityBlock<B> {
    /// x: [batch, c, h, w] -> [batch, c, h, w]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let residual = x.clone();

        let x = self.norm1.forward(x);
        let mut x = self.conv1.forward(x);
        if let Some(dropout) = &self.dropout {
            x = dropout.forward(x);
        }
        let x = self.norm2.forward(x);
        let x = self.conv2.forward(x);

        residual + x
    }

    pub fn has_dropout(&self) -> bool {
        self.dropout.is_some()
    }

    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        kernel_penalty(&self.conv1.weight) + kernel_penalty(&self.conv2.weight)
    }

    pub fn describe(&self) -> String {
        let dropout = match &self.dropout {
            Some(dropout) => format!(", dropout {}", dropout.prob),
            None => String::new(),
        };
        format!(
            "bn+relu, {}{}, bn+relu, {}",
            describe_conv(&self.conv1, 1),
            dropout,
            describe_conv(&self.conv2, 1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    #[test]
    fn expansion_block_projects_shortcut() {
        let device = Default::default();
        let block = ExpansionBlockConfig::new(16, 32, 2).init::<B>(&device);
        let x = Tensor::<B, 4>::random([2, 16, 9, 9], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [2, 32, 5, 5]);
        assert_eq!(block.out_channels(), 32);
    }

    #[test]
    fn identity_block_keeps_shape() {
        let device = Default::default();
        let block = IdentityBlockConfig::new(8).with_dropout(0.3).init::<B>(&device);
        assert!(block.has_dropout());
        let x = Tensor::<B, 4>::random([2, 8, 6, 6], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [2, 8, 6, 6]);
    }

    #[test]
    fn zero_dropout_omits_the_layer() {
        let device = Default::default();
        let block = IdentityBlockConfig::new(8).init::<B>(&device);
        assert!(!block.has_dropout());
        assert!(!block.describe().contains("dropout"));
    }
}
