use criterion::{black_box, criterion_group, criterion_main, Criterion};
use title_core::points::{points, points_fractional, Position};
use title_core::rules::ScoringRuleTable;
use title_core::search::SeasonEvaluator;
use title_core::standings::accumulate;
use title_core::synthetic::{generate_dataset, generate_season, SeasonShape};
use title_core::{BatchConfig, BatchRunner, RuleSet};

fn modern_rules() -> RuleSet {
    ScoringRuleTable::historical().rules_for_year(2023).unwrap()
}

fn sprint_shape() -> SeasonShape {
    SeasonShape {
        rounds: 22,
        competitors: 20,
        sprint_every: Some(4),
        ..Default::default()
    }
}

fn bench_points(c: &mut Criterion) {
    let rules = modern_rules();

    c.bench_function("points_classified", |b| {
        b.iter(|| points(black_box(Position::Classified(7)), black_box(&rules.race_ladder)))
    });

    c.bench_function("points_fractional", |b| {
        b.iter(|| points_fractional(black_box(3.4), black_box(&rules.race_ladder)))
    });
}

fn bench_accumulate(c: &mut Criterion) {
    let rules = modern_rules();
    let season = generate_season(2023, &sprint_shape(), 42);

    c.bench_function("accumulate_22_rounds", |b| {
        b.iter(|| accumulate(black_box(&season), black_box(&rules)))
    });
}

fn bench_search(c: &mut Criterion) {
    let rules = modern_rules();
    let season = generate_season(2023, &sprint_shape(), 42);
    let evaluator = SeasonEvaluator::new(season, rules, 18.0).unwrap();

    c.bench_function("earliest_decided_round", |b| {
        b.iter(|| black_box(&evaluator).earliest_decided_round())
    });

    c.bench_function("timeline_linear", |b| b.iter(|| black_box(&evaluator).timeline()));
}

fn bench_batch(c: &mut Criterion) {
    // 30 seasons spanning three scoring eras
    let shape = SeasonShape {
        rounds: 18,
        competitors: 20,
        ..Default::default()
    };
    let data = generate_dataset(1994..=2023, &shape, &ScoringRuleTable::historical(), 7).unwrap();
    let runner = BatchRunner::new(BatchConfig::new(1994, 2023)).unwrap();

    c.bench_function("batch_30_seasons", |b| b.iter(|| runner.run(black_box(&data)).unwrap()));
}

criterion_group!(benches, bench_points, bench_accumulate, bench_search, bench_batch,);
criterion_main!(benches);
