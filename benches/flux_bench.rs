use criterion::{criterion_group, criterion_main, Criterion};
use defect_network::core::domain::{GroupingParams, MaterialKind, NetworkParams};
use defect_network::engine::flux::{compute_fluxes, compute_partials};
use defect_network::{RateConstants, ReactionNetwork};
use std::hint::black_box;

fn grouped_tungsten(max_vacancy: u32) -> NetworkParams {
    NetworkParams {
        material: MaterialKind::Tungsten,
        max_helium: 8,
        max_vacancy,
        max_interstitial: 5,
        grouping: Some(GroupingParams {
            start: 10,
            width: 4,
            growth: 1.0,
            min_width: 1,
        }),
        ..Default::default()
    }
}

fn bench_flux(c: &mut Criterion) {
    let mut group = c.benchmark_group("tungsten_flux");

    for &max_vacancy in &[50u32, 200] {
        let network = ReactionNetwork::new(&grouped_tungsten(max_vacancy))
            .expect("network should build");
        let rates = RateConstants::compute(&network, 1000.0).expect("rates should compute");
        let state: Vec<f64> = (0..network.dof())
            .map(|i| {
                if i < network.num_clusters() {
                    1e-6
                } else {
                    0.0
                }
            })
            .collect();
        let label = format!("V{}_{}dof", max_vacancy, network.dof());

        group.bench_function(format!("{}_flux", label), |b| {
            let mut out = vec![0.0; network.dof()];
            b.iter(|| {
                out.iter_mut().for_each(|v| *v = 0.0);
                compute_fluxes(&network, &rates, &state, &mut out).expect("flux should succeed");
                black_box(out[0]);
            })
        });

        group.bench_function(format!("{}_jacobian", label), |b| {
            let mut values = vec![0.0; network.sparsity().nnz()];
            b.iter(|| {
                values.iter_mut().for_each(|v| *v = 0.0);
                compute_partials(&network, &rates, &state, &mut values)
                    .expect("partials should succeed");
                black_box(values[0]);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flux);
criterion_main!(benches);
