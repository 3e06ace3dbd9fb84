use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use frontline::core::config::DerivationConfig;
use frontline::front::eligible_pressure_edges;
use frontline::scenario::{generate_grid_scenario, GridScenarioConfig};
use frontline::supply::{compute_supply_reachability, derive_corridor_states};
use frontline::turn::run_turn;

fn bench_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_turn");
    let config = DerivationConfig::default();

    for (width, height) in [(20u32, 20u32), (40, 40), (80, 75)] {
        let scenario = generate_grid_scenario(&GridScenarioConfig {
            width,
            height,
            ..GridScenarioConfig::default()
        });
        let graph = scenario.graph().expect("generated graph is valid");
        let label = format!("{width}x{height}");

        group.bench_with_input(BenchmarkId::new("grid", &label), &scenario, |b, scenario| {
            b.iter_batched(
                || scenario.state.clone(),
                |mut state| run_turn(&mut state, &graph, &config),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_supply(c: &mut Criterion) {
    let scenario = generate_grid_scenario(&GridScenarioConfig::default());
    let graph = scenario.graph().expect("generated graph is valid");
    let state = &scenario.state;
    let config = DerivationConfig::default();

    c.bench_function("eligibility_6000", |b| {
        b.iter(|| eligible_pressure_edges(&state.political_controllers, &graph, &config.eligibility))
    });

    c.bench_function("reachability_and_corridors_6000", |b| {
        b.iter(|| {
            let reach = compute_supply_reachability(
                &state.political_controllers,
                &graph,
                &state.factions,
                &state.supply_rights,
                state.turn,
            );
            derive_corridor_states(&reach, &state.political_controllers, &graph)
        })
    });
}

criterion_group!(derivation_benches, bench_turn, bench_supply);
criterion_main!(derivation_benches);
