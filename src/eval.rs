//! Batch evaluation over logged sessions.
//!
//! Drives the full pipeline: filter sessions whose chosen item is missing
//! from the candidates, rank each session's candidates under a policy, turn
//! ranked lists into relevance vectors, compute per-list metrics in
//! parallel, then aggregate corpus metrics into a [`MetricsReport`].
//!
//! Per-session work fans out over rayon. Any per-session failure aborts the
//! whole batch; a partial report silently missing sessions would be worse
//! than no report.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    average_precision, grouped_personalization_at_k, ndcg_at_k, personalization_at_k,
    prediction_coverage_at_k, relevance_list, ItemId, MetricsReport, RankingPolicy,
    RelevanceError, ScoreTable, UserId,
};

/// One logged session to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalSession {
    pub session_id: u64,
    pub user_id: UserId,
    pub candidates: Vec<ItemId>,
    /// Ground-truth item the user picked.
    pub chosen: ItemId,
    /// Optional grouping key (e.g. a region or shift) for groupwise
    /// personalization. Used only when every retained session has one.
    pub group: Option<u64>,
}

/// Ranked output for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionRecord {
    pub session_id: u64,
    pub ranked: Vec<ItemId>,
    pub relevance: Vec<u8>,
}

/// Batch evaluation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalConfig {
    /// Total number of distinct items the ranker could surface, the
    /// denominator for coverage.
    pub catalog_size: usize,
    /// Cutoffs for NDCG@k, coverage@k and personalization@k.
    pub cutoffs: Vec<usize>,
}

impl EvalConfig {
    #[must_use]
    pub fn new(catalog_size: usize) -> Self {
        Self {
            catalog_size,
            cutoffs: vec![5, 10, 15, 20, 50],
        }
    }
}

/// Per-session records plus the aggregated report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalOutput {
    pub records: Vec<SessionRecord>,
    pub report: MetricsReport,
    /// Sessions dropped because the chosen item was not a candidate.
    pub filtered: usize,
}

/// Errors from [`evaluate_sessions`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("catalog size must be positive")]
    EmptyCatalog,
    #[error("session {session_id}: {source}")]
    Relevance {
        session_id: u64,
        source: RelevanceError,
    },
}

/// Rank and score every session, aggregating corpus metrics.
///
/// Sessions whose chosen item is absent from the candidate list are
/// dropped up front and counted in [`EvalOutput::filtered`]. The
/// remaining sessions fan out over the rayon pool; records come back in
/// input order. Personalization is groupwise when every retained session
/// carries a group key, global otherwise.
pub fn evaluate_sessions(
    sessions: &[EvalSession],
    table: &ScoreTable,
    policy: &RankingPolicy,
    cfg: &EvalConfig,
) -> Result<EvalOutput, EvalError> {
    if cfg.catalog_size == 0 {
        return Err(EvalError::EmptyCatalog);
    }

    let retained: Vec<&EvalSession> = sessions
        .iter()
        .filter(|s| s.candidates.contains(&s.chosen))
        .collect();
    let filtered = sessions.len() - retained.len();
    if filtered > 0 {
        info!(filtered, retained = retained.len(), "dropped sessions without the chosen candidate");
    }

    let records: Vec<SessionRecord> = retained
        .par_iter()
        .map(|session| {
            let ranked = policy.rank(session.user_id, &session.candidates, table);
            let relevance =
                relevance_list(&ranked, session.chosen).map_err(|source| EvalError::Relevance {
                    session_id: session.session_id,
                    source,
                })?;
            Ok(SessionRecord {
                session_id: session.session_id,
                ranked,
                relevance,
            })
        })
        .collect::<Result<_, EvalError>>()?;

    let mut report = MetricsReport::new();
    report.insert("count", records.len() as f64);

    let map = if records.is_empty() {
        0.0
    } else {
        records
            .iter()
            .map(|r| average_precision(&r.relevance))
            .sum::<f64>()
            / records.len() as f64
    };
    report.insert("mean_average_precision", map);

    let lists: Vec<&[ItemId]> = records.iter().map(|r| r.ranked.as_slice()).collect();
    let groups: Option<Vec<u64>> = retained.iter().map(|s| s.group).collect();
    for &k in &cfg.cutoffs {
        let ndcg = if records.is_empty() {
            0.0
        } else {
            records
                .iter()
                .map(|r| ndcg_at_k(&r.relevance, k))
                .sum::<f64>()
                / records.len() as f64
        };
        report.insert(format!("ndcg_at_{k}"), ndcg);
        report.insert(
            format!("coverage_at_{k}"),
            prediction_coverage_at_k(&lists, cfg.catalog_size, k),
        );
        let pers = match &groups {
            Some(g) => grouped_personalization_at_k(&lists, g, k),
            None => personalization_at_k(&lists, k),
        };
        report.insert(format!("personalization_at_{k}"), pers);
    }
    debug!(sessions = records.len(), cutoffs = ?cfg.cutoffs, "evaluation complete");

    Ok(EvalOutput {
        records,
        report,
        filtered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScoreTable;

    fn sessions() -> Vec<EvalSession> {
        vec![
            EvalSession {
                session_id: 1,
                user_id: 1,
                candidates: vec![3, 1, 2],
                chosen: 2,
                group: None,
            },
            EvalSession {
                session_id: 2,
                user_id: 2,
                candidates: vec![4, 5],
                chosen: 4,
                group: None,
            },
            // Chosen item absent: filtered before ranking.
            EvalSession {
                session_id: 3,
                user_id: 3,
                candidates: vec![6, 7],
                chosen: 99,
                group: None,
            },
        ]
    }

    fn table() -> ScoreTable {
        ScoreTable::from_tuples([
            (1, 1, 0.2),
            (1, 2, 0.9),
            (1, 3, 0.5),
            (2, 4, 0.8),
            (2, 5, 0.3),
        ])
    }

    #[test]
    fn filters_rank_and_aggregates() {
        let cfg = EvalConfig::new(10);
        let out = evaluate_sessions(&sessions(), &table(), &RankingPolicy::ScoreSort, &cfg)
            .unwrap();
        assert_eq!(out.filtered, 1);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].ranked, vec![2, 3, 1]);
        assert_eq!(out.records[0].relevance, vec![1, 0, 0]);
        assert_eq!(out.records[1].ranked, vec![4, 5]);
        assert_eq!(out.report.get("count"), Some(2.0));
        // Both chosen items rank first.
        assert_eq!(out.report.get("mean_average_precision"), Some(1.0));
        assert_eq!(out.report.get("ndcg_at_5"), Some(1.0));
    }

    #[test]
    fn report_has_every_cutoff_key() {
        let cfg = EvalConfig::new(10);
        let out = evaluate_sessions(&sessions(), &table(), &RankingPolicy::ScoreSort, &cfg)
            .unwrap();
        for k in [5, 10, 15, 20, 50] {
            assert!(out.report.get(&format!("ndcg_at_{k}")).is_some());
            assert!(out.report.get(&format!("coverage_at_{k}")).is_some());
            assert!(out.report.get(&format!("personalization_at_{k}")).is_some());
        }
    }

    #[test]
    fn coverage_uses_the_catalog_denominator() {
        let cfg = EvalConfig {
            catalog_size: 10,
            cutoffs: vec![3],
        };
        let out = evaluate_sessions(&sessions(), &table(), &RankingPolicy::ScoreSort, &cfg)
            .unwrap();
        // Top-3 union over [2,3,1] and [4,5] is 5 items of 10.
        assert_eq!(out.report.get("coverage_at_3"), Some(0.5));
    }

    #[test]
    fn group_keys_switch_to_groupwise_personalization() {
        let mut with_groups = sessions();
        with_groups.truncate(2);
        for s in &mut with_groups {
            s.group = Some(7);
        }
        let cfg = EvalConfig {
            catalog_size: 10,
            cutoffs: vec![2],
        };
        let out =
            evaluate_sessions(&with_groups, &table(), &RankingPolicy::ScoreSort, &cfg).unwrap();
        // One group with two disjoint top-2 lists.
        assert_eq!(out.report.get("personalization_at_2"), Some(1.0));
    }

    #[test]
    fn empty_catalog_is_fatal() {
        let cfg = EvalConfig::new(0);
        let err = evaluate_sessions(&sessions(), &table(), &RankingPolicy::ScoreSort, &cfg)
            .unwrap_err();
        assert_eq!(err, EvalError::EmptyCatalog);
    }

    #[test]
    fn no_retained_sessions_yields_an_empty_report() {
        let only_bad = vec![EvalSession {
            session_id: 9,
            user_id: 9,
            candidates: vec![1],
            chosen: 2,
            group: None,
        }];
        let cfg = EvalConfig::new(4);
        let out =
            evaluate_sessions(&only_bad, &table(), &RankingPolicy::ScoreSort, &cfg).unwrap();
        assert_eq!(out.filtered, 1);
        assert!(out.records.is_empty());
        assert_eq!(out.report.get("count"), Some(0.0));
        assert_eq!(out.report.get("mean_average_precision"), Some(0.0));
    }
}
