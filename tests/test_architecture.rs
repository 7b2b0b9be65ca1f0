//! Tests for network construction: shapes, widths, depth and validation

use approx::assert_relative_eq;
use burn::{
    backend::NdArray,
    module::Module,
    tensor::{Distribution, Tensor},
};
use wide_resnet::{DataFormat, WideResNetConfig, WrnError};

type B = NdArray<f32>;

fn quiet(config: WideResNetConfig) -> WideResNetConfig {
    config.with_verbose(false)
}

// ============================================================================
// Reference configuration: 32x32x1, 4 classes, N=2, k=2, dropout 0.3
// ============================================================================

#[test]
fn test_reference_output_is_batched_softmax() {
    let device = Default::default();
    let model = WideResNetConfig::demo().init::<B>(&device).unwrap();

    let images = Tensor::<B, 4>::random([3, 32, 32, 1], Distribution::Default, &device);
    let probabilities = model.forward(images);
    assert_eq!(probabilities.dims(), [3, 4]);

    let sums: Vec<f32> = probabilities.sum_dim(1).into_data().to_vec().unwrap();
    for sum in sums {
        assert_relative_eq!(sum, 1.0, epsilon = 1e-4);
    }
}

#[test]
fn test_reference_depth_and_name() {
    let device = Default::default();
    let config = quiet(WideResNetConfig::demo());
    let model = config.init::<B>(&device).unwrap();

    assert_eq!(model.depth(), 16);
    assert_eq!(config.depth(), 16);
    assert_eq!(model.name(), "Wide Residual Network-16-2");
    assert_eq!(model.width_multiplier(), 2);
    assert_eq!(model.num_classes(), 4);
}

#[test]
fn test_stage_widths_double() {
    let device = Default::default();
    let model = quiet(WideResNetConfig::demo()).init::<B>(&device).unwrap();
    assert_eq!(model.stage_widths(), vec![32, 64, 128]);

    let narrow = quiet(WideResNetConfig::demo().with_k(1))
        .init::<B>(&device)
        .unwrap();
    assert_eq!(narrow.stage_widths(), vec![16, 32, 64]);
}

#[test]
fn test_depth_formula_for_several_block_counts() {
    let device = Default::default();
    for n in 1..=4 {
        let config = quiet(WideResNetConfig::demo().with_n(n).with_k(1));
        let model = config.init::<B>(&device).unwrap();
        assert_eq!(model.depth(), 4 + 2 * 3 + 2 * 3 * (n - 1), "N = {n}");
        assert_eq!(model.depth(), config.depth());
    }
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_same_config_builds_same_architecture() {
    let device = Default::default();
    let config = quiet(WideResNetConfig::demo());

    let first = config.init::<B>(&device).unwrap();
    let second = config.init::<B>(&device).unwrap();

    assert_eq!(first.describe(), second.describe());
    assert_eq!(first.num_params(), second.num_params());
}

#[test]
fn test_describe_lists_every_block() {
    let device = Default::default();
    let model = quiet(WideResNetConfig::demo()).init::<B>(&device).unwrap();
    let lines = model.describe();

    // stem + stem norm + 3 x (expansion, identity, norm) + head
    assert_eq!(lines.len(), 2 + 3 * 3 + 1);
    assert_eq!(lines[0], "stem: conv3x3 1->16 stride 1");
    assert!(lines[2].starts_with("stage1.expand: conv3x3 16->32 stride 1"));
    assert!(lines[5].contains("shortcut conv1x1 32->64 stride 2"));
    assert!(lines[3].contains("dropout 0.3"));
    assert_eq!(
        lines.last().unwrap(),
        "head: avgpool 8x8, flatten, dense 128->4, softmax"
    );
}

#[test]
fn test_single_block_stages_have_no_identity_blocks() {
    let device = Default::default();
    let model = quiet(WideResNetConfig::demo().with_n(1))
        .init::<B>(&device)
        .unwrap();
    assert!(model.describe().iter().all(|line| !line.contains("identity")));
    assert_eq!(model.depth(), 10);
}

#[test]
fn test_regularization_penalty_is_positive() {
    let device = Default::default();
    let model = quiet(WideResNetConfig::demo()).init::<B>(&device).unwrap();
    let penalty: f32 = model.regularization_penalty().into_scalar();
    assert!(penalty.is_finite());
    assert!(penalty > 0.0);
}

// ============================================================================
// Input layouts and sizes
// ============================================================================

#[test]
fn test_channels_first_input() {
    let device = Default::default();
    let config = quiet(
        WideResNetConfig::new(5e-4, [3, 32, 32], 0.9, 0.1)
            .with_nb_classes(10)
            .with_n(1)
            .with_data_format(DataFormat::ChannelsFirst),
    );
    let model = config.init::<B>(&device).unwrap();
    assert_eq!(model.data_format(), DataFormat::ChannelsFirst);

    let images = Tensor::<B, 4>::zeros([2, 3, 32, 32], &device);
    assert_eq!(model.forward(images).dims(), [2, 10]);
}

#[test]
fn test_larger_input_pools_to_a_grid() {
    let device = Default::default();
    let config = quiet(WideResNetConfig {
        input_dim: [64, 64, 1],
        ..WideResNetConfig::demo().with_n(1).with_k(1)
    });
    let model = config.init::<B>(&device).unwrap();

    let images = Tensor::<B, 4>::zeros([2, 64, 64, 1], &device);
    assert_eq!(model.forward(images).dims(), [2, 4]);
    assert!(model
        .describe()
        .last()
        .unwrap()
        .contains("dense 256->4"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_rejects_input_too_small_for_pool() {
    let device = Default::default();
    let config = WideResNetConfig {
        input_dim: [28, 28, 1],
        ..WideResNetConfig::demo()
    };
    match config.init::<B>(&device) {
        Err(WrnError::InputTooSmall { height, width, min }) => {
            assert_eq!((height, width, min), (28, 28, 8));
        }
        other => panic!("expected InputTooSmall, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_rejects_invalid_hyperparameters() {
    let cases = [
        ("N", WideResNetConfig::demo().with_n(0)),
        ("k", WideResNetConfig::demo().with_k(0)),
        ("dropout", WideResNetConfig::demo().with_dropout(1.0)),
        ("nb_classes", WideResNetConfig::demo().with_nb_classes(0)),
    ];
    for (expected, config) in cases {
        match config.validate() {
            Err(WrnError::InvalidHyperparameter { name, .. }) => assert_eq!(name, expected),
            other => panic!("{expected}: expected InvalidHyperparameter, got {other:?}"),
        }
    }

    let mut negative_rate = WideResNetConfig::demo();
    negative_rate.learning_rate = -0.1;
    let mut excess_momentum = WideResNetConfig::demo();
    excess_momentum.momentum = 1.5;
    for (expected, config) in [("learning_rate", negative_rate), ("momentum", excess_momentum)] {
        match config.validate() {
            Err(WrnError::InvalidHyperparameter { name, .. }) => assert_eq!(name, expected),
            other => panic!("{expected}: expected InvalidHyperparameter, got {other:?}"),
        }
    }
}

#[test]
fn test_accepts_boundary_optimizer_settings() {
    let mut frozen = WideResNetConfig::demo();
    frozen.learning_rate = 0.0;
    assert!(frozen.validate().is_ok());

    let mut full_momentum = WideResNetConfig::demo();
    full_momentum.momentum = 1.0;
    assert!(full_momentum.validate().is_ok());

    let mut plain_sgd = WideResNetConfig::demo();
    plain_sgd.momentum = 0.0;
    assert!(plain_sgd.validate().is_ok());
}
