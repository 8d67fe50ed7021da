//! `offrank`: deterministic offline evaluation for ranking policies.
//!
//! Designed for recommendation-research pipelines: a model (or baseline
//! policy) has produced a scalar score for every (user, item) pair it was
//! asked about, and you want to know how good the induced rankings are,
//! and what a *new* policy would have been worth on traffic logged under
//! an *old* one, without deploying anything.
//!
//! The crate covers four stages:
//!
//! 1. **Ranking** ([`rank_by_score`], [`RankingPolicy`]): turn a session's
//!    unordered candidate list into a ranked list using a [`ScoreTable`],
//!    by a deterministic reverse sort of `(score, item)` pairs, via a
//!    fitted bandit policy ([`EpsilonGreedy`], [`LinUcb`]), or by the
//!    seeded random-shuffle floor baseline.
//! 2. **Relevance** ([`relevance_list`]): align the ranked list with the
//!    ground-truth chosen item as a binary relevance vector.
//! 3. **Rank metrics** ([`average_precision`], [`ndcg_at_k`],
//!    [`prediction_coverage_at_k`], [`personalization_at_k`]): per-list and
//!    corpus-level quality, aggregated into an immutable [`MetricsReport`]
//!    by the batch engine ([`evaluate_sessions`]).
//! 4. **Off-policy estimation** ([`off_policy_evaluate`]): IPS, capped IPS
//!    and self-normalized IPS (SNIPS) value estimates with Student-t
//!    confidence intervals sized by Owen's effective sample size, fed by an
//!    [`EmpiricalPropensity`] logging-policy model.
//!
//! **Goals:**
//! - **Deterministic by default**: same inputs + seed yield the same
//!   ranking and the same report. Ties break on the full `(score, item)`
//!   tuple, never on insertion order.
//! - **Shared-nothing parallelism**: per-session work fans out over a rayon
//!   pool; the score table and the fitted policy are the only shared
//!   read-only state.
//! - **Loud failure**: a zero logging propensity or a chosen item missing
//!   from its candidate list aborts the run with an error naming the input,
//!   rather than leaking `inf`/`nan` into a report.
//!
//! **Non-goals:**
//! - Not a training framework: scores arrive already computed.
//! - No storage, plotting, or orchestration; reports are plain values the
//!   caller persists however it likes.
//!
//! # References
//!
//! - Swaminathan & Joachims (2015), "The Self-Normalized Estimator for
//!   Counterfactual Learning": the SNIPS estimator.
//! - Owen (2013), *Monte Carlo theory, methods and examples*, ch. 9:
//!   effective sample size under skewed importance weights.
//! - Järvelin & Kekäläinen (2002): discounted cumulative gain.

#![forbid(unsafe_code)]

/// User identifier (an index into the pipeline's user vocabulary).
pub type UserId = u64;
/// Item identifier (an index into the pipeline's item catalog).
pub type ItemId = u64;

/// One row of the historical interaction table.
///
/// This is the input both for fitting bandit ranking policies and for the
/// empirical logging-policy propensity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// How many times this user visited (was shown) this item.
    pub visit_count: u64,
    /// How many of those visits converted.
    pub buy_count: u64,
}

mod stable_hash;
pub use stable_hash::*;

mod score;
pub use score::*;

mod ranker;
pub use ranker::*;

mod bandit;
pub use bandit::*;

mod relevance;
pub use relevance::*;

mod metrics;
pub use metrics::*;

mod propensity;
pub use propensity::*;

mod offpolicy;
pub use offpolicy::*;

mod eval;
pub use eval::*;
