//! Bandit ranking policies.
//!
//! Both policies satisfy the same two-method contract used by
//! [`RankingPolicy`][crate::RankingPolicy]:
//!
//! - `fit(history)`: one batch pass over the historical interaction table,
//!   run single-threaded before any ranking call;
//! - `rank(items, arm_scores)`: reorder a candidate list given the parallel
//!   model scores, through `&self` so a fitted policy can serve concurrent
//!   ranking calls without locks.
//!
//! Randomness (epsilon-greedy exploration) is derived per call from the
//! policy seed and a stable hash of the candidate list, so repeated calls
//! over the same session are reproducible and no RNG state is mutated.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::HashMap;

use crate::ranker::sort_items_by_score_desc;
use crate::{stable_hash_items, Interaction, ItemId};

fn empirical_rates(history: &[Interaction]) -> HashMap<ItemId, f64> {
    let mut visits: HashMap<ItemId, u64> = HashMap::new();
    let mut buys: HashMap<ItemId, u64> = HashMap::new();
    for row in history {
        *visits.entry(row.item_id).or_insert(0) += row.visit_count;
        *buys.entry(row.item_id).or_insert(0) += row.buy_count;
    }
    visits
        .into_iter()
        .filter(|&(_, v)| v > 0)
        .map(|(item, v)| {
            let b = buys.get(&item).copied().unwrap_or(0);
            (item, (b as f64 / v as f64).clamp(0.0, 1.0))
        })
        .collect()
}

/// Configuration for [`EpsilonGreedy`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpsilonGreedyConfig {
    /// Exploration probability per rank position (clamped to `[0, 1]`).
    pub epsilon: f64,
    /// Seed for the per-call exploration RNG.
    pub seed: u64,
}

impl Default for EpsilonGreedyConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            seed: 0,
        }
    }
}

/// Epsilon-greedy ranking policy.
///
/// Fills rank positions one at a time: with probability `1 - epsilon` the
/// highest-scored remaining arm is placed next; otherwise one of the
/// non-greedy remaining arms is chosen uniformly. `fit` learns per-item
/// empirical conversion rates used as the score for arms with no model
/// score at all.
#[derive(Debug, Clone, Default)]
pub struct EpsilonGreedy {
    cfg: EpsilonGreedyConfig,
    rates: HashMap<ItemId, f64>,
}

impl EpsilonGreedy {
    pub fn new(cfg: EpsilonGreedyConfig) -> Self {
        Self {
            cfg,
            rates: HashMap::new(),
        }
    }

    fn epsilon(&self) -> f64 {
        let e = self.cfg.epsilon;
        if e.is_finite() {
            e.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Learn per-item empirical conversion rates from history.
    pub fn fit(&mut self, history: &[Interaction]) {
        self.rates = empirical_rates(history);
    }

    // Absent (or non-finite) model scores fall back to the fitted rate;
    // arms with neither sort last. A real score of -1.0 stays a real score.
    fn effective_score(&self, item: ItemId, arm_score: Option<f64>) -> f64 {
        match arm_score {
            Some(s) if s.is_finite() => s,
            _ => self.rates.get(&item).copied().unwrap_or(f64::NEG_INFINITY),
        }
    }

    /// Reorder `items` given their parallel `arm_scores`; `None` marks an
    /// item the model produced no score for.
    ///
    /// Returns a permutation of `items`. Deterministic for a fixed seed and
    /// candidate list; empty input yields empty output.
    #[must_use]
    pub fn rank(&self, items: &[ItemId], arm_scores: &[Option<f64>]) -> Vec<ItemId> {
        if items.is_empty() {
            return Vec::new();
        }
        let mut rng = StdRng::seed_from_u64(stable_hash_items(self.cfg.seed, items));
        let eps = self.epsilon();

        let mut remaining: Vec<(f64, ItemId)> = items
            .iter()
            .enumerate()
            .map(|(i, &item)| {
                let s = arm_scores.get(i).copied().flatten();
                (self.effective_score(item, s), item)
            })
            .collect();

        let mut ranked = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let greedy = greedy_index(&remaining);
            let pick = if remaining.len() > 1 && rng.random::<f64>() < eps {
                // Uniform over the non-greedy arms.
                let mut idx = rng.random_range(0..remaining.len() - 1);
                if idx >= greedy {
                    idx += 1;
                }
                idx
            } else {
                greedy
            };
            ranked.push(remaining.swap_remove(pick).1);
        }
        ranked
    }
}

fn greedy_index(remaining: &[(f64, ItemId)]) -> usize {
    let mut best = 0;
    for (i, pair) in remaining.iter().enumerate().skip(1) {
        let b = remaining[best];
        if pair.0.total_cmp(&b.0).then_with(|| pair.1.cmp(&b.1)).is_gt() {
            best = i;
        }
    }
    best
}

/// Context vector dimension for [`LinUcb`]: intercept + arm score.
const CONTEXT_DIM: usize = 2;

#[inline]
fn context(score: Option<f64>) -> [f64; CONTEXT_DIM] {
    [1.0, score.filter(|s| s.is_finite()).unwrap_or(0.0)]
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn mat_vec(a: &[f64], dim: usize, x: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; dim];
    for (i, o) in out.iter_mut().enumerate() {
        *o = dot(&a[i * dim..(i + 1) * dim], x);
    }
    out
}

/// Configuration for [`LinUcb`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinUcbConfig {
    /// Exploration strength (must be finite and >= 0).
    pub alpha: f64,
    /// Ridge regularization (must be finite and > 0).
    pub lambda: f64,
}

impl Default for LinUcbConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            lambda: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct ArmState {
    // A^{-1} for ridge regression (d x d, row-major).
    a_inv: Vec<f64>,
    // Reward-weighted feature sum (d).
    b: Vec<f64>,
    uses: u64,
}

impl ArmState {
    fn new(lambda: f64) -> Self {
        let diag = if lambda.is_finite() && lambda > 0.0 {
            1.0 / lambda
        } else {
            1.0
        };
        let mut a_inv = vec![0.0; CONTEXT_DIM * CONTEXT_DIM];
        for i in 0..CONTEXT_DIM {
            a_inv[i * CONTEXT_DIM + i] = diag;
        }
        Self {
            a_inv,
            b: vec![0.0; CONTEXT_DIM],
            uses: 0,
        }
    }

    // Sherman-Morrison rank-1 update for A := A + x x^T, plus b += r x.
    fn update(&mut self, x: &[f64], reward: f64) {
        let ax = mat_vec(&self.a_inv, CONTEXT_DIM, x);
        let denom = 1.0 + dot(x, &ax);
        if denom.is_finite() && denom > 1e-12 {
            for i in 0..CONTEXT_DIM {
                for j in 0..CONTEXT_DIM {
                    self.a_inv[i * CONTEXT_DIM + j] -= (ax[i] * ax[j]) / denom;
                }
            }
        }
        for (bi, xi) in self.b.iter_mut().zip(x.iter()) {
            *bi += reward * xi;
        }
        self.uses = self.uses.saturating_add(1);
    }
}

/// Linear UCB ranking policy.
///
/// Per-item ridge-regression state over a two-dimensional context
/// (intercept + arm score). `fit` replays the interaction history as batch
/// Sherman-Morrison updates; `rank` orders candidates by the upper
/// confidence score `theta . x + alpha * sqrt(x' A^{-1} x)` with the usual
/// reverse `(score, item)` tie-break. Items never seen during `fit` fall
/// back to the prior state, where the mean is zero and the bonus dominates.
#[derive(Debug, Clone, Default)]
pub struct LinUcb {
    cfg: LinUcbConfig,
    arms: HashMap<ItemId, ArmState>,
}

impl LinUcb {
    pub fn new(cfg: LinUcbConfig) -> Self {
        Self {
            cfg,
            arms: HashMap::new(),
        }
    }

    fn alpha(&self) -> f64 {
        if self.cfg.alpha.is_finite() && self.cfg.alpha >= 0.0 {
            self.cfg.alpha
        } else {
            0.0
        }
    }

    /// Replay the interaction history into per-item sufficient statistics.
    ///
    /// Each history row contributes one update with the item's empirical
    /// conversion rate as both the context feature and the reward.
    pub fn fit(&mut self, history: &[Interaction]) {
        let lambda = self.cfg.lambda;
        for row in history {
            if row.visit_count == 0 {
                continue;
            }
            let rate = (row.buy_count as f64 / row.visit_count as f64).clamp(0.0, 1.0);
            let x = context(Some(rate));
            self.arms
                .entry(row.item_id)
                .or_insert_with(|| ArmState::new(lambda))
                .update(&x, rate);
        }
    }

    fn ucb(&self, item: ItemId, arm_score: Option<f64>) -> f64 {
        let x = context(arm_score);
        let prior;
        let st = match self.arms.get(&item) {
            Some(st) => st,
            None => {
                prior = ArmState::new(self.cfg.lambda);
                &prior
            }
        };
        let theta = mat_vec(&st.a_inv, CONTEXT_DIM, &st.b);
        let mean = dot(&theta, &x);
        let ax = mat_vec(&st.a_inv, CONTEXT_DIM, &x);
        let var = dot(&x, &ax).max(0.0);
        mean + self.alpha() * var.sqrt()
    }

    /// Number of items with fitted state.
    #[must_use]
    pub fn fitted_arms(&self) -> usize {
        self.arms.len()
    }

    /// Reorder `items` by descending upper-confidence score; `None` marks
    /// an item the model produced no score for.
    ///
    /// Returns a permutation of `items`; empty input yields empty output.
    #[must_use]
    pub fn rank(&self, items: &[ItemId], arm_scores: &[Option<f64>]) -> Vec<ItemId> {
        let pairs = items
            .iter()
            .enumerate()
            .map(|(i, &item)| {
                let s = arm_scores.get(i).copied().flatten();
                (self.ucb(item, s), item)
            })
            .collect();
        sort_items_by_score_desc(pairs)
    }
}
