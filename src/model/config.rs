use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{WrnError, WrnResult};

/// Base channel counts of the three stages, before the width multiplier
pub const BASE_WIDTHS: [usize; 3] = [16, 32, 64];
/// Filters of the initial convolution
pub const STEM_FILTERS: usize = 16;
/// Side of the fixed average-pool window in the head
pub const POOL_SIZE: usize = 8;

/// Memory layout of an input image tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// `[batch, channels, height, width]`
    ChannelsFirst,
    /// `[batch, height, width, channels]`
    #[default]
    ChannelsLast,
}

impl DataFormat {
    /// Index of the channel dimension in an input tensor
    pub fn channel_axis(&self) -> i32 {
        match self {
            DataFormat::ChannelsFirst => 1,
            DataFormat::ChannelsLast => -1,
        }
    }

    /// Splits a per-sample shape into `(channels, height, width)`
    pub fn split(&self, dims: [usize; 3]) -> (usize, usize, usize) {
        match self {
            DataFormat::ChannelsFirst => (dims[0], dims[1], dims[2]),
            DataFormat::ChannelsLast => (dims[2], dims[0], dims[1]),
        }
    }
}

/// Shapes realised by one stage for a given input size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    pub index: usize,
    pub width: usize,
    pub stride: usize,
    pub input_hw: [usize; 2],
    pub output_hw: [usize; 2],
    pub blocks: usize,
}

/// Hyperparameters of a wide residual network
///
/// The configuration is fixed once built: the `with_*` methods consume and
/// return it, and `init`/`compile` only borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideResNetConfig {
    /// L2 strength applied to every convolution and dense kernel
    pub weight_decay: f64,
    /// Per-sample input shape, laid out according to `data_format`
    pub input_dim: [usize; 3],
    pub momentum: f64,
    pub learning_rate: f64,
    #[serde(default = "default_nb_classes")]
    pub nb_classes: usize,
    /// Blocks per stage, the expansion block included
    #[serde(rename = "N", default = "default_n")]
    pub n: usize,
    /// Width multiplier
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub dropout: f64,
    #[serde(default)]
    pub data_format: DataFormat,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

fn default_nb_classes() -> usize {
    100
}

fn default_n() -> usize {
    2
}

fn default_k() -> usize {
    1
}

fn default_verbose() -> bool {
    true
}

impl WideResNetConfig {
    pub fn new(
        weight_decay: f64,
        input_dim: [usize; 3],
        momentum: f64,
        learning_rate: f64,
    ) -> Self {
        Self {
            weight_decay,
            input_dim,
            momentum,
            learning_rate,
            nb_classes: default_nb_classes(),
            n: default_n(),
            k: default_k(),
            dropout: 0.0,
            data_format: DataFormat::default(),
            verbose: default_verbose(),
        }
    }

    /// Small grayscale network: WRN-16-2 over 32x32x1 images and 4 classes
    pub fn demo() -> Self {
        Self::new(5e-4, [32, 32, 1], 0.9, 0.1)
            .with_nb_classes(4)
            .with_n(2)
            .with_k(2)
            .with_dropout(0.3)
    }

    /// WRN-28-10 for 32x32 RGB images and 10 classes
    pub fn cifar10() -> Self {
        Self::new(5e-4, [32, 32, 3], 0.9, 0.1)
            .with_nb_classes(10)
            .with_n(4)
            .with_k(10)
            .with_dropout(0.3)
    }

    pub fn with_nb_classes(mut self, nb_classes: usize) -> Self {
        self.nb_classes = nb_classes;
        self
    }

    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Depth label used in the network name
    ///
    /// The naming convention starts from a base count of four and adds two
    /// per block, so it is a label rather than a layer count.
    pub fn depth(&self) -> usize {
        4 + 2 * BASE_WIDTHS.len() + 2 * BASE_WIDTHS.len() * self.n.saturating_sub(1)
    }

    pub fn name(&self) -> String {
        format!("Wide Residual Network-{}-{}", self.depth(), self.k)
    }

    /// Channel count of each stage
    pub fn stage_widths(&self) -> [usize; 3] {
        BASE_WIDTHS.map(|base| base * self.k)
    }

    pub fn input_channels(&self) -> usize {
        self.data_format.split(self.input_dim).0
    }

    /// Spatial sizes flowing through the three stages
    pub fn stage_plan(&self) -> Vec<StagePlan> {
        let (_, height, width) = self.data_format.split(self.input_dim);
        let mut hw = [height, width];

        BASE_WIDTHS
            .iter()
            .enumerate()
            .map(|(i, base)| {
                let stride = if i == 0 { 1 } else { 2 };
                let output_hw = [hw[0].div_ceil(stride), hw[1].div_ceil(stride)];
                let plan = StagePlan {
                    index: i + 1,
                    width: base * self.k,
                    stride,
                    input_hw: hw,
                    output_hw,
                    blocks: self.n,
                };
                hw = output_hw;
                plan
            })
            .collect()
    }

    /// Spatial size left after the head's average pool
    pub fn pooled_hw(&self) -> [usize; 2] {
        let last = self.stage_plan()[BASE_WIDTHS.len() - 1].output_hw;
        last.map(|side| {
            if side < POOL_SIZE {
                0
            } else {
                (side - POOL_SIZE) / POOL_SIZE + 1
            }
        })
    }

    /// Input width of the dense classifier
    pub fn head_features(&self) -> usize {
        let [h, w] = self.pooled_hw();
        self.stage_widths()[BASE_WIDTHS.len() - 1] * h * w
    }

    /// Checks the hyperparameters and the input-shape contract of the head
    pub fn validate(&self) -> WrnResult<()> {
        if self.n < 1 {
            return Err(WrnError::invalid("N", self.n, "at least one block per stage is required"));
        }
        if self.k < 1 {
            return Err(WrnError::invalid("k", self.k, "width multiplier must be at least 1"));
        }
        if self.nb_classes < 1 {
            return Err(WrnError::invalid("nb_classes", self.nb_classes, "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(WrnError::invalid("dropout", self.dropout, "must lie in [0, 1)"));
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(WrnError::invalid(
                "weight_decay",
                self.weight_decay,
                "must be finite and non-negative",
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(WrnError::invalid(
                "learning_rate",
                self.learning_rate,
                "must be finite and non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.momentum) {
            return Err(WrnError::invalid("momentum", self.momentum, "must lie in [0, 1]"));
        }
        if self.input_dim.contains(&0) {
            return Err(WrnError::invalid(
                "input_dim",
                format!("{:?}", self.input_dim),
                "every dimension must be non-zero",
            ));
        }

        let [height, width] = self.stage_plan()[BASE_WIDTHS.len() - 1].output_hw;
        if height < POOL_SIZE || width < POOL_SIZE {
            let (_, height, width) = self.data_format.split(self.input_dim);
            return Err(WrnError::InputTooSmall {
                height,
                width,
                min: POOL_SIZE,
            });
        }

        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> WrnResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> WrnResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
