use burn::data::dataset::Dataset;

use crate::model::WideResNetConfig;

/// A single labelled image ready to be batched
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    /// Pixel values flattened in the order of the configured `input_dim`
    pub pixels: Vec<f32>,
    /// Class index in `0..nb_classes`
    pub label: usize,
}

/// In-memory image dataset
#[derive(Debug, Clone, Default)]
pub struct ImageDataset {
    pub items: Vec<ImageItem>,
}

impl ImageDataset {
    /// Creates a dataset directly from pre-built items
    pub fn from_items(items: Vec<ImageItem>) -> Self {
        Self { items }
    }

    /// Deterministic class-dependent patterns, useful for smoke runs
    ///
    /// Item `i` is labelled `i % nb_classes`; its pixels are a ramp whose
    /// phase depends on the label.
    pub fn synthetic(len: usize, input_dim: [usize; 3], nb_classes: usize) -> Self {
        let pixels_per_item: usize = input_dim.iter().product();
        let classes = nb_classes.max(1);

        let items = (0..len)
            .map(|i| {
                let label = i % classes;
                let pixels = (0..pixels_per_item)
                    .map(|p| ((p + label * 7) % 13) as f32 / 13.0)
                    .collect();
                ImageItem { pixels, label }
            })
            .collect();

        Self { items }
    }

    /// Synthetic dataset shaped for the given network configuration
    pub fn synthetic_for(config: &WideResNetConfig, len: usize) -> Self {
        Self::synthetic(len, config.input_dim, config.nb_classes)
    }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
