//! Rank-quality metrics over relevance vectors and ranked lists.
//!
//! Per-list metrics (average precision, NDCG@k) take the binary relevance
//! vector produced by [`relevance_list`][crate::relevance_list]; corpus
//! metrics (coverage@k, personalization@k) take the ranked lists
//! themselves. All metrics are pure functions returning values in `[0, 1]`.
//!
//! Degenerate inputs are values, not errors: an all-zero relevance vector
//! scores `0.0`, and corpus metrics over fewer than two lists score `0.0`.

use std::collections::{BTreeMap, HashSet};

use crate::ItemId;

/// Binary average precision.
///
/// Mean of precision@i over the relevant positions; `0.0` when the vector
/// has no relevant entry.
#[must_use]
pub fn average_precision(relevance: &[u8]) -> f64 {
    let mut hits = 0u64;
    let mut sum = 0.0;
    for (i, &r) in relevance.iter().enumerate() {
        if r > 0 {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 {
        0.0
    } else {
        sum / hits as f64
    }
}

fn dcg(relevance: &[u8], k: usize) -> f64 {
    relevance
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, &r)| r as f64 / ((i + 2) as f64).log2())
        .sum()
}

/// Normalized discounted cumulative gain at cutoff `k`.
///
/// DCG over the first `k` positions with the `log2(i + 2)` discount,
/// normalized by the DCG of the ideal (descending) ordering of the same
/// relevance values truncated to `k`. Returns `0.0` when the ideal DCG is
/// zero (no relevant entry) or when `k` is zero.
#[must_use]
pub fn ndcg_at_k(relevance: &[u8], k: usize) -> f64 {
    if k == 0 || relevance.is_empty() {
        return 0.0;
    }
    let mut ideal = relevance.to_vec();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let idcg = dcg(&ideal, k);
    if idcg == 0.0 {
        0.0
    } else {
        dcg(relevance, k) / idcg
    }
}

/// Fraction of the catalog that appears in at least one top-`k` list.
///
/// Returns `0.0` for an empty catalog or an empty list collection.
#[must_use]
pub fn prediction_coverage_at_k<L>(lists: &[L], catalog_size: usize, k: usize) -> f64
where
    L: AsRef<[ItemId]>,
{
    if catalog_size == 0 || lists.is_empty() {
        return 0.0;
    }
    let covered: HashSet<ItemId> = lists
        .iter()
        .flat_map(|list| list.as_ref().iter().take(k).copied())
        .collect();
    covered.len() as f64 / catalog_size as f64
}

// Cosine similarity of two binary top-k membership vectors:
// |A ∩ B| / sqrt(|A| * |B|).
fn topk_cosine(a: &[ItemId], b: &[ItemId], k: usize) -> f64 {
    let sa: HashSet<ItemId> = a.iter().take(k).copied().collect();
    let sb: HashSet<ItemId> = b.iter().take(k).copied().collect();
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count() as f64;
    inter / ((sa.len() as f64) * (sb.len() as f64)).sqrt()
}

/// Mean pairwise dissimilarity `1 - cosine` of binary top-`k` membership
/// vectors over all distinct list pairs.
///
/// `1.0` means every pair of lists recommends disjoint top-`k` sets.
/// Returns `0.0` for fewer than two lists.
#[must_use]
pub fn personalization_at_k<L>(lists: &[L], k: usize) -> f64
where
    L: AsRef<[ItemId]>,
{
    let n = lists.len();
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut pairs = 0u64;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += 1.0 - topk_cosine(lists[i].as_ref(), lists[j].as_ref(), k);
            pairs += 1;
        }
    }
    sum / pairs as f64
}

/// Groupwise personalization@k.
///
/// Partitions the lists by their parallel group keys, computes
/// [`personalization_at_k`] within each group holding at least two lists,
/// and averages the per-group values. Groups with a single list carry no
/// pairwise signal and are skipped; returns `0.0` when no group qualifies.
#[must_use]
pub fn grouped_personalization_at_k<L>(lists: &[L], groups: &[u64], k: usize) -> f64
where
    L: AsRef<[ItemId]>,
{
    let mut by_group: BTreeMap<u64, Vec<&[ItemId]>> = BTreeMap::new();
    for (list, &g) in lists.iter().zip(groups.iter()) {
        by_group.entry(g).or_default().push(list.as_ref());
    }
    let mut sum = 0.0;
    let mut counted = 0u64;
    for members in by_group.values() {
        if members.len() < 2 {
            continue;
        }
        sum += personalization_at_k(members, k);
        counted += 1;
    }
    if counted == 0 {
        0.0
    } else {
        sum / counted as f64
    }
}

/// Immutable named-metric report.
///
/// Keys are sorted for deterministic serialization and iteration. The
/// conventional keys are `count`, `mean_average_precision`, `ndcg_at_{k}`,
/// `coverage_at_{k}` and `personalization_at_{k}`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MetricsReport {
    values: BTreeMap<String, f64>,
}

impl MetricsReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
