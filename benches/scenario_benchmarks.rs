use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rcc5_risk::analysis::{Analyzer, Options};
use rcc5_risk::decompose::DependencyGraph;
use rcc5_risk::model::{ArchitectureModel, ComponentKind};
use rcc5_risk::region::{RegionKind, RegionPair, RegionTable};
use rcc5_risk::report::VecSink;
use rcc5_risk::session::{Literal, Session, SessionOptions};
use rcc5_risk::topology::domain::Domain;
use rcc5_risk::topology::{ground_theory, Axioms};
use rcc5_risk::Rcc5;

/// Agent with `n` functional blocks chained into a ring
fn block_ring(n: usize) -> ArchitectureModel {
    let mut model = ArchitectureModel::new();
    model.agent("a", "ring");
    for i in 0..n {
        let id = format!("b{i}");
        model.component(&id, &id, ComponentKind::FunctionalBlock, "a");
    }
    for i in 0..n {
        model.flow(&format!("b{i}"), &format!("b{}", (i + 1) % n));
    }
    model
}

fn grounding(c: &mut Criterion) {
    let mut group = c.benchmark_group("grounding");

    for axioms in [Axioms::Mereology, Axioms::Mereotopology] {
        for regions in [2, 3, 4, 6] {
            let names: Vec<String> = (0..regions).map(|i| format!("R{i}")).collect();
            let id = BenchmarkId::new(format!("{axioms:?}"), regions);
            group.bench_with_input(id, &names, |b, names| {
                b.iter(|| {
                    let domain = Domain::new(black_box(names), 2).unwrap();
                    ground_theory(&domain, axioms).unwrap()
                });
            });
        }
    }

    group.finish();
}

fn scenario_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenario");
    let mut session = Session::new(&["A", "B", "C"], &SessionOptions::default()).unwrap();

    group.bench_function("consistent_triangle", |b| {
        let literals = [
            Literal::holds(Rcc5::Pp, "A", "B"),
            Literal::holds(Rcc5::Pp, "B", "C"),
            Literal::holds(Rcc5::Pp, "A", "C"),
        ];
        b.iter(|| session.try_scenario(black_box(&literals)).unwrap());
    });

    group.bench_function("inconsistent_triangle", |b| {
        let literals = [
            Literal::holds(Rcc5::Pp, "A", "B"),
            Literal::holds(Rcc5::Pp, "B", "C"),
            Literal::holds(Rcc5::Pp, "C", "A"),
        ];
        b.iter(|| session.try_scenario(black_box(&literals)).unwrap());
    });

    group.finish();
}

fn decomposition(c: &mut Criterion) {
    let mut table = RegionTable::new();
    let regions: Vec<_> = (0..10_000).map(|_| table.fresh(RegionKind::Belief)).collect();
    let pairs: Vec<RegionPair> = regions
        .chunks(4)
        .flat_map(|ring| (0..ring.len()).map(move |i| RegionPair::new(ring[i], ring[(i + 1) % ring.len()])))
        .collect();

    c.bench_function("decompose_rings", |b| {
        b.iter(|| DependencyGraph::new(black_box(&pairs)).decompose());
    });
}

fn analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    group.sample_size(10);

    let model = block_ring(2);
    group.bench_function("block_loop", |b| {
        b.iter(|| {
            let mut sink = VecSink::default();
            Analyzer::new(Options::default())
                .run(black_box(&model), &mut sink)
                .unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, grounding, scenario_checks, decomposition, analysis);
criterion_main!(benches);
