//! Tests for the epoch-indexed learning-rate schedule

use wide_resnet::training::{
    lr_schedule, LearningRateScheduler, LrSchedule, StepSchedule,
};

// ============================================================================
// lr_schedule
// ============================================================================

#[test]
fn test_constant_within_each_range() {
    for epoch in 0..60 {
        assert_eq!(lr_schedule(epoch), 0.1);
    }
    for epoch in 60..120 {
        assert_eq!(lr_schedule(epoch), 0.02);
    }
    for epoch in 120..160 {
        assert_eq!(lr_schedule(epoch), 0.004);
    }
    for epoch in [160, 161, 250, 10_000] {
        assert_eq!(lr_schedule(epoch), 0.0008);
    }
}

#[test]
fn test_boundaries() {
    let expected = [
        (59, 0.1),
        (60, 0.02),
        (119, 0.02),
        (120, 0.004),
        (159, 0.004),
        (160, 0.0008),
    ];
    for (epoch, lr) in expected {
        assert_eq!(lr_schedule(epoch), lr, "epoch {epoch}");
    }
}

#[test]
fn test_never_increases() {
    let rates: Vec<f64> = (0..300).map(lr_schedule).collect();
    assert!(rates.windows(2).all(|pair| pair[1] <= pair[0]));
}

// ============================================================================
// StepSchedule / LearningRateScheduler
// ============================================================================

#[test]
fn test_custom_step_schedule() {
    let schedule = StepSchedule::new(vec![2, 5], vec![1.0, 0.5, 0.25]).unwrap();
    let rates: Vec<f64> = (0..7).map(|epoch| schedule.learning_rate(epoch)).collect();
    assert_eq!(rates, vec![1.0, 1.0, 0.5, 0.5, 0.5, 0.25, 0.25]);
}

#[test]
fn test_default_scheduler_uses_wide_resnet_schedule() {
    let scheduler = LearningRateScheduler::default();
    assert_eq!(scheduler.rate(0), 0.1);
    assert_eq!(scheduler.rate(120), 0.004);

    let step = LearningRateScheduler::new(StepSchedule::wide_resnet());
    for epoch in [0, 59, 60, 119, 120, 159, 160] {
        assert_eq!(step.rate(epoch), scheduler.rate(epoch));
    }
}
