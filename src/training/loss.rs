use burn::tensor::{activation::log_softmax, backend::Backend, ElementConversion, Int, Tensor};

/// Categorical cross-entropy between logits [batch, classes] and class indices [batch]
///
/// Equivalent to applying softmax then the negative log-likelihood of the
/// target class, computed in log space for stability.
pub fn categorical_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let [batch_size, _] = logits.dims();
    log_softmax(logits, 1)
        .gather(1, targets.reshape([batch_size, 1]))
        .mean()
        .neg()
}

/// Counts how many arg-max predictions match the targets
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let [batch_size, _] = logits.dims();
    let predictions = logits.argmax(1).reshape([batch_size]);
    let sum: i64 = predictions.equal(targets).int().sum().into_scalar().elem();
    sum as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn uniform_logits_cost_log_of_class_count() {
        let device = Default::default();
        let logits = Tensor::<B, 2>::zeros([3, 4], &device);
        let targets = Tensor::<B, 1, Int>::from_ints([0, 2, 3], &device);

        let loss: f32 = categorical_cross_entropy(logits, targets).into_scalar().elem();
        assert_relative_eq!(loss, 4f32.ln(), epsilon = 1e-5);
    }

    #[test]
    fn confident_correct_logits_cost_almost_nothing() {
        let device = Default::default();
        let logits = Tensor::<B, 2>::from_floats([[20.0, 0.0], [0.0, 20.0]], &device);
        let targets = Tensor::<B, 1, Int>::from_ints([0, 1], &device);

        let loss: f32 = categorical_cross_entropy(logits, targets).into_scalar().elem();
        assert!(loss < 1e-6);
    }

    #[test]
    fn counts_matching_predictions() {
        let device = Default::default();
        let logits = Tensor::<B, 2>::from_floats([[0.9, 0.1], [0.2, 0.8], [0.7, 0.3]], &device);
        let targets = Tensor::<B, 1, Int>::from_ints([0, 1, 1], &device);

        assert_eq!(count_correct(logits, targets), 2);
    }
}
