//! Performance benchmarks for insertion sessions and snapshots.
//!
//! Run with: `cargo bench --bench insertion`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Full session | <100µs at 10k items | Snapshot validation dominates |
//! | Snapshot fingerprint | Linear in items | xxh64 over canonical JSON |
//! | Tier classification | <100ns | Binary search over 11 thresholds |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};

use prestige_ranking::{
    derive_score, CategoryId, ComparisonOutcome, InsertionSession, ItemId, ItemKind,
    PartitionScope, PartitionSnapshot, RankedItem, ScorePolicy, SessionStep, ThresholdVariant,
    TierClassifier,
};

/// Create a snapshot of `n` albums scored n..1.
fn make_snapshot(n: usize) -> PartitionSnapshot {
    let items = (0..n)
        .map(|i| {
            RankedItem::new(
                ItemId::new(format!("album-{i}")),
                ItemKind::Album,
                CategoryId::new("loved"),
                i,
                (n - i) as f64,
            )
        })
        .collect();
    PartitionSnapshot::new(PartitionScope::category(CategoryId::new("loved"), ItemKind::Album), items)
}

/// Run a session to completion, alternating answers.
fn run_session(snapshot: &PartitionSnapshot) -> usize {
    let mut session = InsertionSession::begin(ItemId::new("new"), snapshot.clone())
        .expect("valid snapshot");
    let mut step = session.step();
    let mut flip = false;
    loop {
        match step {
            SessionStep::Complete { final_position } => return final_position,
            SessionStep::Compare(_) => {
                flip = !flip;
                let outcome = if flip {
                    ComparisonOutcome::NewItemWins
                } else {
                    ComparisonOutcome::ExistingItemWins
                };
                step = session.answer(outcome).expect("session in progress");
            }
        }
    }
}

/// Benchmark a full session including snapshot validation.
fn bench_full_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_session");

    for size in [10, 100, 1_000, 10_000] {
        let snapshot = make_snapshot(size);
        let policy = ScorePolicy::default();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("items", size), &snapshot, |b, snapshot| {
            b.iter(|| {
                let position = run_session(black_box(snapshot));
                derive_score(position, snapshot.items(), &policy)
            })
        });
    }

    group.finish();
}

/// Benchmark snapshot construction (sort + fingerprint).
fn bench_snapshot_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_fingerprint");

    for size in [10, 100, 1_000, 10_000] {
        let items = make_snapshot(size).items().to_vec();
        let scope = PartitionScope::category(CategoryId::new("loved"), ItemKind::Album);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("items", size), &items, |b, items| {
            b.iter(|| PartitionSnapshot::compute_fingerprint(&scope, black_box(items)))
        });
    }

    group.finish();
}

/// Benchmark tier classification.
fn bench_tier_classification(c: &mut Criterion) {
    let classifier = TierClassifier::default();

    c.bench_function("classify_track_standard", |b| {
        b.iter(|| {
            classifier.classify(black_box(2_999), ItemKind::Track, ThresholdVariant::Standard)
        })
    });
}

criterion_group!(
    benches,
    bench_full_session,
    bench_snapshot_fingerprint,
    bench_tier_classification,
);
criterion_main!(benches);
