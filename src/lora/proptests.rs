//! Property-based tests for LoRA settings validation

use super::*;
use proptest::prelude::*;

fn arb_valid_settings() -> impl Strategy<Value = LoraSettings> {
    (
        1u32..=1024,                    // rank
        1u32..512,                      // alpha
        0.0f64..0.99,                   // dropout
        1u32..50,                       // epochs
        1e-7f64..1.0,                   // learning rate
        proptest::option::of(1u32..64), // evals per epoch
    )
        .prop_map(|(rank, alpha, dropout, epochs, lr, evals)| {
            let mut settings = LoraSettings::new(rank, alpha, dropout, epochs, lr);
            settings.evals_per_epoch = evals;
            settings
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_settings_pass(settings in arb_valid_settings()) {
        prop_assert!(settings.validate().is_ok());
    }

    #[test]
    fn prop_negative_dropout_fails(settings in arb_valid_settings(), dropout in -10.0f64..-1e-9) {
        let mut settings = settings;
        settings.dropout = dropout;
        prop_assert!(matches!(settings.validate(), Err(LoraError::InvalidDropout(_))));
    }

    #[test]
    fn prop_large_learning_rate_fails(settings in arb_valid_settings(), lr in 1.0001f64..100.0) {
        let mut settings = settings;
        settings.learning_rate = lr;
        prop_assert!(matches!(settings.validate(), Err(LoraError::InvalidLearningRate(_))));
    }

    #[test]
    fn prop_total_evals_scales_with_epochs(settings in arb_valid_settings()) {
        if let Some(per_epoch) = settings.evals_per_epoch {
            prop_assert_eq!(settings.total_evals(), Some(per_epoch * settings.num_epochs));
        } else {
            prop_assert_eq!(settings.total_evals(), None);
        }
    }
}
