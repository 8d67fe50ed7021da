//! Binary relevance vectors for ranked lists.
//!
//! A ranked list paired with the session's ground-truth chosen item maps to
//! a `{0,1}` vector aligned with the list, with a `1` exactly at the chosen
//! item's position. Sessions whose chosen item is not in the candidate list
//! are filtered out before ranking; by the time a list reaches this module
//! the chosen item must be present, so an absent item is a fatal input
//! contract violation rather than an all-zero vector.

use crate::ItemId;

/// Errors building a relevance vector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelevanceError {
    /// The chosen item does not appear in the ranked list. Upstream session
    /// filtering should have dropped this session already.
    #[error("chosen item {chosen} is not in the ranked list of {list_len} items")]
    ChosenItemMissing { chosen: ItemId, list_len: usize },
}

/// Build the binary relevance vector for `ranked` against `chosen`.
///
/// Returns a vector the same length as `ranked` with a single `1` at the
/// chosen item's index (duplicates of the chosen item each score `1`).
pub fn relevance_list(ranked: &[ItemId], chosen: ItemId) -> Result<Vec<u8>, RelevanceError> {
    let rel: Vec<u8> = ranked
        .iter()
        .map(|&item| u8::from(item == chosen))
        .collect();
    if rel.iter().all(|&r| r == 0) {
        return Err(RelevanceError::ChosenItemMissing {
            chosen,
            list_len: ranked.len(),
        });
    }
    Ok(rel)
}
