//! Empirical logging-policy propensities.
//!
//! The logging policy behind historical data is usually unknown, so its
//! propensities are estimated from visit counts: the propensity of showing
//! `item` to `user` is the fraction of that user's visits that landed on
//! the item. Pairs never observed for the user estimate to `0.0`, which
//! the off-policy evaluator rejects as unusable logged data.

use std::collections::HashMap;

use crate::{Interaction, ItemId, UserId};

/// Per-(user, item) empirical propensity model fitted from visit counts.
#[derive(Debug, Clone, Default)]
pub struct EmpiricalPropensity {
    pair_visits: HashMap<(UserId, ItemId), u64>,
    user_visits: HashMap<UserId, u64>,
}

impl EmpiricalPropensity {
    /// Fit the model from an interaction history in one pass.
    #[must_use]
    pub fn fit(history: &[Interaction]) -> Self {
        let mut model = Self::default();
        for row in history {
            *model
                .pair_visits
                .entry((row.user_id, row.item_id))
                .or_insert(0) += row.visit_count;
            *model.user_visits.entry(row.user_id).or_insert(0) += row.visit_count;
        }
        model
    }

    /// Estimated probability that the logging policy showed `item` to
    /// `user`. `0.0` for pairs (or users) with no recorded visits.
    #[must_use]
    pub fn propensity(&self, user: UserId, item: ItemId) -> f64 {
        let total = self.user_visits.get(&user).copied().unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        let pair = self.pair_visits.get(&(user, item)).copied().unwrap_or(0);
        pair as f64 / total as f64
    }

    /// Number of distinct (user, item) pairs with recorded visits.
    #[must_use]
    pub fn pairs(&self) -> usize {
        self.pair_visits.len()
    }
}
