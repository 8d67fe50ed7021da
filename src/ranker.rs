//! List ranking: unordered candidates in, ordered recommendations out.
//!
//! The default mode is a deterministic reverse sort of `(score, item)`
//! pairs: descending score, with descending item id as the tie-break. The
//! tie-break is part of the contract, not an accident of sort stability;
//! two runs over the same inputs must produce identical rankings even when
//! scores collide.
//!
//! Bandit mode swaps the sort for a fitted [`EpsilonGreedy`] or [`LinUcb`]
//! policy while keeping the same lookup path. A random-shuffle mode serves
//! as the floor baseline. Either way the output is a permutation of the
//! input: ranking never adds or drops candidates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{stable_hash_items, EpsilonGreedy, Interaction, ItemId, LinUcb, ScoreTable, UserId};

/// Sort items by `(score, item)` compared in reverse.
///
/// Descending score first; equal scores fall back to descending item id.
/// This reproduces a reverse sort of score/item pairs exactly, so ties are
/// deterministic across runs and platforms.
pub(crate) fn sort_items_by_score_desc(mut pairs: Vec<(f64, ItemId)>) -> Vec<ItemId> {
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    pairs.into_iter().map(|(_, item)| item).collect()
}

/// Rank `candidates` for `user` by score table lookup.
///
/// Candidates missing from the table get [`crate::MISSING_SCORE`] and sort
/// last. An empty candidate list yields an empty ranking, not an error.
#[must_use]
pub fn rank_by_score(user: UserId, candidates: &[ItemId], table: &ScoreTable) -> Vec<ItemId> {
    let pairs = candidates
        .iter()
        .map(|&item| (table.score(user, item), item))
        .collect();
    sort_items_by_score_desc(pairs)
}

/// Shuffle `candidates` uniformly, ignoring scores.
///
/// The floor baseline: any useful ranker should beat it. The RNG is
/// derived from `seed` and the candidate list itself, so repeated calls
/// over the same session reproduce the same shuffle.
#[must_use]
pub fn rank_randomly(seed: u64, candidates: &[ItemId]) -> Vec<ItemId> {
    let mut ranked = candidates.to_vec();
    let mut rng = StdRng::seed_from_u64(stable_hash_items(seed, candidates));
    ranked.shuffle(&mut rng);
    ranked
}

/// How candidate lists are turned into rankings.
///
/// A closed set of variants behind one `fit`/`rank` interface: new policies
/// are added here, not through open-ended trait objects. Bandit variants
/// are fitted once from the historical interaction table, before any
/// ranking call, and are read-only afterwards (safe to share across the
/// session fan-out).
#[derive(Debug, Clone)]
pub enum RankingPolicy {
    /// Plain reverse sort of `(score, item)` pairs.
    ScoreSort,
    /// Uniform shuffle, the floor baseline.
    Random { seed: u64 },
    /// Epsilon-greedy arm selection per rank position.
    EpsilonGreedy(EpsilonGreedy),
    /// Linear UCB over a per-item ridge model.
    LinUcb(LinUcb),
}

impl RankingPolicy {
    /// Fit the policy's internal state from historical interactions.
    ///
    /// Runs once, single-threaded, before the evaluation fan-out.
    /// `ScoreSort` has no state and ignores the history.
    pub fn fit(&mut self, history: &[Interaction]) {
        match self {
            Self::ScoreSort | Self::Random { .. } => {}
            Self::EpsilonGreedy(p) => p.fit(history),
            Self::LinUcb(p) => p.fit(history),
        }
    }

    /// Rank `candidates` for `user` using scores from `table`.
    ///
    /// Always returns a permutation of `candidates`; empty input yields
    /// empty output.
    #[must_use]
    pub fn rank(&self, user: UserId, candidates: &[ItemId], table: &ScoreTable) -> Vec<ItemId> {
        match self {
            Self::ScoreSort => rank_by_score(user, candidates, table),
            Self::Random { seed } => rank_randomly(*seed, candidates),
            Self::EpsilonGreedy(p) => {
                let scores = table.try_scores_for(user, candidates);
                p.rank(candidates, &scores)
            }
            Self::LinUcb(p) => {
                let scores = table.try_scores_for(user, candidates);
                p.rank(candidates, &scores)
            }
        }
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::ScoreSort
    }
}
