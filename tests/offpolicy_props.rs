//! Property tests for the off-policy estimators.

use proptest::prelude::*;

use offrank::{off_policy_evaluate, Estimator, OffPolicyConfig};

fn logged_rows() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<f64>)> {
    (4usize..40).prop_flat_map(|n| {
        (
            prop::collection::vec(0.0f64..=1.0, n..=n),
            prop::collection::vec(0.05f64..=1.0, n..=n),
            prop::collection::vec(0.05f64..=1.0, n..=n),
        )
    })
}

proptest! {
    #[test]
    fn intervals_bracket_their_estimates((rewards, target, logging) in logged_rows()) {
        let cfg = OffPolicyConfig::default();
        if let Ok(report) = off_policy_evaluate(&rewards, &target, &logging, &cfg) {
            prop_assert_eq!(report.rows.len(), 3);
            for row in &report.rows {
                prop_assert!(row.ci_low <= row.estimate + 1e-12);
                prop_assert!(row.estimate <= row.ci_high + 1e-12);
            }
            prop_assert!(report.effective_sample_size >= 2.0);
            prop_assert!(report.effective_sample_size <= rewards.len() as f64 + 1e-9);
        }
    }

    #[test]
    fn snips_is_rescale_invariant(
        (rewards, target, logging) in logged_rows(),
        scale in 0.1f64..5.0,
    ) {
        let cfg = OffPolicyConfig::default();
        let scaled: Vec<f64> = target.iter().map(|t| t * scale).collect();
        let base = off_policy_evaluate(&rewards, &target, &logging, &cfg);
        let resc = off_policy_evaluate(&rewards, &scaled, &logging, &cfg);
        if let (Ok(a), Ok(b)) = (base, resc) {
            let sa = a.row(Estimator::Snips).estimate;
            let sb = b.row(Estimator::Snips).estimate;
            prop_assert!((sa - sb).abs() < 1e-9);
        }
    }

    #[test]
    fn snips_stays_inside_the_reward_range((rewards, target, logging) in logged_rows()) {
        let cfg = OffPolicyConfig::default();
        if let Ok(report) = off_policy_evaluate(&rewards, &target, &logging, &cfg) {
            let snips = report.row(Estimator::Snips).estimate;
            prop_assert!((-1e-12..=1.0 + 1e-12).contains(&snips));
        }
    }

    #[test]
    fn a_generous_cap_makes_cips_equal_ips((rewards, target, logging) in logged_rows()) {
        // Weights are bounded by 1 / 0.05 = 20, so a cap above that never clips.
        let cfg = OffPolicyConfig { cap: 25.0, ..OffPolicyConfig::default() };
        if let Ok(report) = off_policy_evaluate(&rewards, &target, &logging, &cfg) {
            let ips = report.row(Estimator::Ips);
            let cips = report.row(Estimator::CappedIps);
            prop_assert!((ips.estimate - cips.estimate).abs() < 1e-12);
            prop_assert!((ips.ci_low - cips.ci_low).abs() < 1e-12);
            prop_assert!((ips.ci_high - cips.ci_high).abs() < 1e-12);
        }
    }

    #[test]
    fn capping_never_raises_the_estimate(
        (rewards, target, logging) in logged_rows(),
        cap in 1.0f64..10.0,
    ) {
        let cfg = OffPolicyConfig { cap, ..OffPolicyConfig::default() };
        if let Ok(report) = off_policy_evaluate(&rewards, &target, &logging, &cfg) {
            let ips = report.row(Estimator::Ips).estimate;
            let cips = report.row(Estimator::CappedIps).estimate;
            // Rewards are non-negative, so clipping weights can only shrink.
            prop_assert!(cips <= ips + 1e-12);
        }
    }
}
