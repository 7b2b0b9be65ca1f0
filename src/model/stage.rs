use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor},
};
use tracing::debug;

use crate::model::{
    blocks::{ExpansionBlock, ExpansionBlockConfig, IdentityBlock, IdentityBlockConfig},
    config::DataFormat,
    layers::{NormRelu, NormReluConfig},
};

/// Configuration for one stage of constant width
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub index: usize,
    pub in_channels: usize,
    pub width: usize,
    pub stride: usize,
    /// Total blocks, the expansion block included
    pub blocks: usize,
    pub dropout: f64,
    pub data_format: DataFormat,
}

impl StageConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Stage<B> {
        debug!(
            stage = self.index,
            channel_axis = self.data_format.channel_axis(),
            width = self.width,
            stride = self.stride,
            "building stage"
        );

        let expansion =
            ExpansionBlockConfig::new(self.in_channels, self.width, self.stride).init(device);

        let identities = (1..self.blocks)
            .map(|_| {
                IdentityBlockConfig::new(self.width)
                    .with_dropout(self.dropout)
                    .init(device)
            })
            .collect();

        Stage {
            expansion,
            identities,
            norm: NormReluConfig::new(self.width).init(device),
        }
    }
}

/// Expansion block, (N - 1) identity blocks, then BN -> ReLU
#[derive(Module, Debug)]
pub struct Stage<B: Backend> {
    expansion: ExpansionBlock<B>,
    identities: Vec<IdentityBlock<B>>,
    norm: NormRelu<B>,
}

impl<B: Backend> Stage<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.expansion.forward(x);
        for block in &self.identities {
            x = block.forward(x);
        }
        self.norm.forward(x)
    }

    pub fn width(&self) -> usize {
        self.expansion.out_channels()
    }

    /// Convolutions in this stage, shortcut projection excluded
    pub fn num_convs(&self) -> usize {
        2 + 2 * self.identities.len()
    }

    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        self.identities
            .iter()
            .fold(self.expansion.l2_penalty(), |acc, block| acc + block.l2_penalty())
    }

    pub fn describe(&self, index: usize, lines: &mut Vec<String>) {
        lines.push(format!("stage{index}.expand: {}", self.expansion.describe()));
        for (i, block) in self.identities.iter().enumerate() {
            lines.push(format!("stage{index}.identity{}: {}", i + 1, block.describe()));
        }
        lines.push(format!("stage{index}.norm: bn+relu {}", self.norm.channels()));
    }
}
