use criterion::{black_box, criterion_group, criterion_main, Criterion};

use offrank::{
    evaluate_sessions, off_policy_evaluate, personalization_at_k, rank_by_score, EvalConfig,
    EvalSession, OffPolicyConfig, RankingPolicy, ScoreTable,
};

fn synthetic_table(users: u64, items: u64) -> ScoreTable {
    let mut tuples = Vec::new();
    for u in 0..users {
        for i in 0..items {
            // Deterministic pseudo-scores, cheap to regenerate.
            let s = ((u * 31 + i * 17) % 997) as f64 / 997.0;
            tuples.push((u, i, s));
        }
    }
    ScoreTable::from_tuples(tuples)
}

fn synthetic_sessions(users: u64, items: u64) -> Vec<EvalSession> {
    (0..users)
        .map(|u| EvalSession {
            session_id: u,
            user_id: u,
            candidates: (0..items).collect(),
            chosen: u % items,
            group: Some(u % 4),
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let table = synthetic_table(1, 500);
    let candidates: Vec<u64> = (0..500).collect();
    let mut group = c.benchmark_group("rank");
    group.bench_function("score_sort_500", |b| {
        b.iter(|| rank_by_score(black_box(0), black_box(&candidates), &table));
    });
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let table = synthetic_table(200, 50);
    let sessions = synthetic_sessions(200, 50);
    let cfg = EvalConfig::new(50);
    let mut group = c.benchmark_group("evaluate");
    group.bench_function("batch_200x50", |b| {
        b.iter(|| {
            evaluate_sessions(
                black_box(&sessions),
                &table,
                &RankingPolicy::ScoreSort,
                &cfg,
            )
        });
    });
    group.finish();
}

fn bench_personalization(c: &mut Criterion) {
    let lists: Vec<Vec<u64>> = (0..100)
        .map(|u: u64| (0..20).map(|i| (u * 7 + i) % 300).collect())
        .collect();
    let mut group = c.benchmark_group("personalization");
    group.bench_function("pairwise_100x20", |b| {
        b.iter(|| personalization_at_k(black_box(&lists), 10));
    });
    group.finish();
}

fn bench_off_policy(c: &mut Criterion) {
    let n = 10_000;
    let rewards: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
    let target: Vec<f64> = (0..n).map(|i| 0.1 + 0.8 * ((i % 7) as f64 / 7.0)).collect();
    let logging: Vec<f64> = (0..n).map(|i| 0.1 + 0.8 * ((i % 5) as f64 / 5.0)).collect();
    let cfg = OffPolicyConfig::default();
    let mut group = c.benchmark_group("off_policy");
    group.bench_function("estimate_10k", |b| {
        b.iter(|| off_policy_evaluate(black_box(&rewards), &target, &logging, &cfg));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rank,
    bench_evaluate,
    bench_personalization,
    bench_off_policy
);
criterion_main!(benches);
