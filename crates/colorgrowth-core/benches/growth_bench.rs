use colorgrowth_core::{GrowthConfig, GrowthSim, SeedCount};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::time::Duration;

fn bench_growth_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("growth_run");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(8));

    for &(width, height, viscosity) in &[(128u32, 64u32, 0u32), (128, 64, 4), (256, 128, 4)] {
        group.bench_function(
            format!("{width}x{height}_viscosity{viscosity}_full_fill"),
            |b| {
                b.iter_batched(
                    || {
                        GrowthSim::new(GrowthConfig {
                            width,
                            height,
                            viscosity,
                            seed_count: SeedCount::Fixed(5),
                            rng_seed: Some(0xBEEF),
                            stop_fill_fraction: 1.0,
                            ..GrowthConfig::default()
                        })
                        .expect("sim")
                    },
                    |mut sim| sim.run(),
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_growth_runs);
criterion_main!(benches);
