//! Score lookup tables with a defined missing-key policy.
//!
//! A [`ScoreTable`] maps (user, item) pairs, or bare items, to a scalar
//! model score. The table may be partial: a miss resolves to
//! [`MISSING_SCORE`], a sentinel strictly below any real score, so missing
//! items deterministically sort last instead of raising an error.
//!
//! Baseline tables (most-popular, most-popular-per-user) are built directly
//! from the historical interaction counts; they let the same evaluation
//! path score non-model policies.

use std::collections::HashMap;

use crate::{Interaction, ItemId, UserId};

/// Sentinel returned for (user, item) pairs absent from a score table.
///
/// Strictly lower than any score a model produces, so unknown items always
/// rank below known ones.
pub const MISSING_SCORE: f64 = -1.0;

/// A possibly-partial mapping from (user, item) or item to a model score.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScoreTable {
    /// Personalized scores keyed by (user, item).
    PerUserItem(HashMap<(UserId, ItemId), f64>),
    /// User-independent scores keyed by item (popularity baselines, global
    /// item models).
    PerItem(HashMap<ItemId, f64>),
}

impl ScoreTable {
    /// Build a personalized table from `(user, item, score)` tuples.
    pub fn from_tuples<I>(tuples: I) -> Self
    where
        I: IntoIterator<Item = (UserId, ItemId, f64)>,
    {
        Self::PerUserItem(
            tuples
                .into_iter()
                .map(|(u, i, s)| ((u, i), s))
                .collect(),
        )
    }

    /// Build a user-independent table from `(item, score)` pairs.
    pub fn from_item_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (ItemId, f64)>,
    {
        Self::PerItem(scores.into_iter().collect())
    }

    /// Most-popular baseline: each item scored by its total buy count.
    pub fn most_popular(history: &[Interaction]) -> Self {
        let mut buys: HashMap<ItemId, f64> = HashMap::new();
        for row in history {
            *buys.entry(row.item_id).or_insert(0.0) += row.buy_count as f64;
        }
        Self::PerItem(buys)
    }

    /// Most-popular-per-user baseline: each (user, item) pair scored by a
    /// weighted sum of its buy and visit counts.
    pub fn most_popular_per_user(
        history: &[Interaction],
        buy_importance: f64,
        visit_importance: f64,
    ) -> Self {
        let mut scores: HashMap<(UserId, ItemId), f64> = HashMap::new();
        for row in history {
            *scores.entry((row.user_id, row.item_id)).or_insert(0.0) +=
                (row.buy_count as f64) * buy_importance
                    + (row.visit_count as f64) * visit_importance;
        }
        Self::PerUserItem(scores)
    }

    /// Look up the score for `(user, item)`, falling back to
    /// [`MISSING_SCORE`] on a miss.
    #[must_use]
    pub fn score(&self, user: UserId, item: ItemId) -> f64 {
        self.try_score(user, item).unwrap_or(MISSING_SCORE)
    }

    /// Look up the score for `(user, item)`, keeping the miss explicit.
    ///
    /// A stored score of `-1.0` comes back as `Some(-1.0)`, distinct from
    /// an absent key; consumers that must tell a real score from a miss
    /// use this instead of comparing against the sentinel.
    #[must_use]
    pub fn try_score(&self, user: UserId, item: ItemId) -> Option<f64> {
        match self {
            Self::PerUserItem(m) => m.get(&(user, item)).copied(),
            Self::PerItem(m) => m.get(&item).copied(),
        }
    }

    /// Look up the scores for all of a user's candidates, in order.
    #[must_use]
    pub fn scores_for(&self, user: UserId, items: &[ItemId]) -> Vec<f64> {
        items.iter().map(|&i| self.score(user, i)).collect()
    }

    /// Like [`ScoreTable::scores_for`], with misses kept explicit.
    #[must_use]
    pub fn try_scores_for(&self, user: UserId, items: &[ItemId]) -> Vec<Option<f64>> {
        items.iter().map(|&i| self.try_score(user, i)).collect()
    }

    /// Number of scored keys in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::PerUserItem(m) => m.len(),
            Self::PerItem(m) => m.len(),
        }
    }

    /// True when the table holds no scores at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
