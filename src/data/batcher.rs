use std::marker::PhantomData;

use burn::{
    data::dataloader::batcher::Batcher,
    tensor::{backend::Backend, Int, Tensor},
};

use crate::data::dataset::ImageItem;

#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// [batch, d0, d1, d2] in the layout of `input_dim`
    pub images: Tensor<B, 4>,
    /// Class indices: [batch]
    pub targets: Tensor<B, 1, Int>,
}

/// Stacks image items into a batch for a fixed per-sample shape
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    input_dim: [usize; 3],
    _backend: PhantomData<B>,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(input_dim: [usize; 3]) -> Self {
        Self {
            input_dim,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>, device: &B::Device) -> ImageBatch<B> {
        let batch_size = items.len();
        let [d0, d1, d2] = self.input_dim;

        let pixels_flat: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        let labels_flat: Vec<i32> = items.iter().map(|item| item.label as i32).collect();

        let images = Tensor::<B, 1>::from_floats(pixels_flat.as_slice(), device)
            .reshape([batch_size, d0, d1, d2]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels_flat.as_slice(), device);

        ImageBatch { images, targets }
    }
}
