//! Off-policy estimators for counterfactual policy value.
//!
//! Given logged rewards with the propensities of the logging policy and a
//! candidate target policy, estimates the value the target policy would
//! have achieved, three ways:
//!
//! - **IPS**: plain inverse-propensity scoring, unbiased but high-variance;
//! - **CIPS**: IPS with importance weights clipped at a cap, trading bias
//!   for variance;
//! - **SNIPS**: self-normalized IPS, invariant to a positive rescaling of
//!   the target propensities.
//!
//! Confidence intervals use a Student-t critical value with degrees of
//! freedom taken from Owen's effective sample size, which discounts the
//! nominal N by the imbalance of the importance weights. The effective
//! sample size and critical value come from the uncapped weights and are
//! shared by all three estimators.
//!
//! References:
//! - Swaminathan & Joachims, "The self-normalized estimator for
//!   counterfactual learning" (2015).
//! - Owen, "Monte Carlo theory, methods and examples" (2013), ch. 9.

use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

/// Errors from [`off_policy_evaluate`]. All fatal: logged data that cannot
/// support an estimate should stop the run, not skew it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OffPolicyError {
    #[error("input length mismatch: {rewards} rewards, {target} target propensities, {logging} logging propensities")]
    LengthMismatch {
        rewards: usize,
        target: usize,
        logging: usize,
    },
    #[error("no logged rows to evaluate")]
    NoData,
    /// A logging propensity of zero means the logged action was impossible
    /// under the logging policy as modeled; the row cannot be reweighted.
    #[error("logging propensity {value} at row {row} is not positive")]
    InvalidLoggingPropensity { row: usize, value: f64 },
    #[error("effective sample size {n_e:.3} is below 2; the weights are too imbalanced for a t interval")]
    DegenerateSampleSize { n_e: f64 },
    #[error("cannot compute the Student-t critical value for alpha {alpha} with {dof:.3} degrees of freedom")]
    CriticalValue { alpha: f64, dof: f64 },
}

/// Configuration for [`off_policy_evaluate`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffPolicyConfig {
    /// Importance-weight cap for the CIPS estimator.
    pub cap: f64,
    /// Two-sided significance level for the confidence intervals.
    pub alpha: f64,
}

impl Default for OffPolicyConfig {
    fn default() -> Self {
        Self {
            cap: 15.0,
            alpha: 0.00125,
        }
    }
}

/// The three reported estimators, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Estimator {
    Ips,
    CappedIps,
    Snips,
}

impl Estimator {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ips => "ips",
            Self::CappedIps => "cips",
            Self::Snips => "snips",
        }
    }
}

impl std::fmt::Display for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One estimator's point estimate and confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimateRow {
    pub estimator: Estimator,
    pub estimate: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Report over all three estimators plus the shared diagnostics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffPolicyReport {
    /// Rows in [`Estimator`] order: Ips, CappedIps, Snips.
    pub rows: Vec<EstimateRow>,
    /// Owen effective sample size from the uncapped weights.
    pub effective_sample_size: f64,
    /// Shared Student-t critical value.
    pub critical_value: f64,
}

impl OffPolicyReport {
    /// Look up one estimator's row.
    ///
    /// # Panics
    /// Panics if the row is absent. [`off_policy_evaluate`] always emits
    /// all three, so a miss means the report was built by hand and broke
    /// that invariant.
    #[must_use]
    pub fn row(&self, estimator: Estimator) -> &EstimateRow {
        self.rows
            .iter()
            .find(|r| r.estimator == estimator)
            .expect("report holds one row per estimator")
    }
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn ci_row(estimator: Estimator, estimate: f64, variance: f64, n_e: f64, cv: f64) -> EstimateRow {
    let half = cv * variance.max(0.0).sqrt() / n_e.sqrt();
    EstimateRow {
        estimator,
        estimate,
        ci_low: estimate - half,
        ci_high: estimate + half,
    }
}

/// Estimate the target policy's value from logged data.
///
/// `rewards[i]` is the observed reward for row `i`, `target[i]` and
/// `logging[i]` the two policies' propensities for the logged action.
/// Fails fast on mismatched lengths, empty input, any non-positive
/// logging propensity and a degenerate effective sample size.
pub fn off_policy_evaluate(
    rewards: &[f64],
    target: &[f64],
    logging: &[f64],
    cfg: &OffPolicyConfig,
) -> Result<OffPolicyReport, OffPolicyError> {
    if rewards.len() != target.len() || rewards.len() != logging.len() {
        return Err(OffPolicyError::LengthMismatch {
            rewards: rewards.len(),
            target: target.len(),
            logging: logging.len(),
        });
    }
    if rewards.is_empty() {
        return Err(OffPolicyError::NoData);
    }

    let mut weights = Vec::with_capacity(rewards.len());
    for (row, (&t, &l)) in target.iter().zip(logging.iter()).enumerate() {
        if !l.is_finite() || l <= 0.0 {
            return Err(OffPolicyError::InvalidLoggingPropensity { row, value: l });
        }
        weights.push(t / l);
    }

    let n = rewards.len() as f64;
    let w_mean = mean(&weights);
    let w_sq_mean = mean(&weights.iter().map(|w| w * w).collect::<Vec<_>>());
    let n_e = n * w_mean * w_mean / w_sq_mean;
    if !n_e.is_finite() || n_e < 2.0 {
        return Err(OffPolicyError::DegenerateSampleSize { n_e });
    }

    let dof = n_e - 1.0;
    let dist = StudentsT::new(0.0, 1.0, dof).map_err(|_| OffPolicyError::CriticalValue {
        alpha: cfg.alpha,
        dof,
    })?;
    let cv = dist.inverse_cdf(1.0 - cfg.alpha);
    if !cv.is_finite() {
        return Err(OffPolicyError::CriticalValue {
            alpha: cfg.alpha,
            dof,
        });
    }
    debug!(n = rewards.len(), n_e, cv, "off-policy inputs validated");

    // IPS over the uncapped weights.
    let rw: Vec<f64> = rewards
        .iter()
        .zip(weights.iter())
        .map(|(&r, &w)| r * w)
        .collect();
    let ips = mean(&rw);
    let ips_var = mean(&rw.iter().map(|x| (x - ips) * (x - ips)).collect::<Vec<_>>());

    // CIPS clips the weights element-wise before the same moments.
    let capped_rw: Vec<f64> = rewards
        .iter()
        .zip(weights.iter())
        .map(|(&r, &w)| r * w.min(cfg.cap))
        .collect();
    let cips = mean(&capped_rw);
    let cips_var = mean(
        &capped_rw
            .iter()
            .map(|x| (x - cips) * (x - cips))
            .collect::<Vec<_>>(),
    );

    // SNIPS normalizes by the weight sum instead of N.
    let w_sum: f64 = weights.iter().sum();
    let snips = rw.iter().sum::<f64>() / w_sum;
    let snips_var = rewards
        .iter()
        .zip(weights.iter())
        .map(|(&r, &w)| (r - snips) * (r - snips) * w * w)
        .sum::<f64>()
        / (w_sum * w_sum);

    Ok(OffPolicyReport {
        rows: vec![
            ci_row(Estimator::Ips, ips, ips_var, n_e, cv),
            ci_row(Estimator::CappedIps, cips, cips_var, n_e, cv),
            ci_row(Estimator::Snips, snips, snips_var, n_e, cv),
        ],
        effective_sample_size: n_e,
        critical_value: cv,
    })
}
