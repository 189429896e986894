#![allow(dead_code)]

use defect_network::core::domain::{GroupingParams, MaterialKind, NetworkParams};
use defect_network::ReactionNetwork;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pure interstitial clusters I_1..I_max in tungsten, no grouping.
pub fn interstitial_params(max_interstitial: u32) -> NetworkParams {
    NetworkParams {
        material: MaterialKind::Tungsten,
        max_helium: 0,
        max_vacancy: 0,
        max_interstitial,
        grouping: None,
        ..Default::default()
    }
}

pub fn tungsten_params(max_helium: u32, max_vacancy: u32, max_interstitial: u32) -> NetworkParams {
    NetworkParams {
        material: MaterialKind::Tungsten,
        max_helium,
        max_vacancy,
        max_interstitial,
        grouping: None,
        ..Default::default()
    }
}

/// Small tungsten network with 2D He/V super-clusters from V_4 on.
pub fn grouped_tungsten_params() -> NetworkParams {
    NetworkParams {
        grouping: Some(GroupingParams {
            start: 4,
            width: 4,
            growth: 0.0,
            min_width: 1,
        }),
        ..tungsten_params(2, 8, 2)
    }
}

pub fn xenon_params(max_xenon: u32, grouped: bool) -> NetworkParams {
    NetworkParams {
        material: MaterialKind::Xenon,
        max_xenon,
        grouping: grouped.then(|| GroupingParams {
            start: 10,
            width: 4,
            growth: 1.0,
            min_width: 1,
        }),
        ..Default::default()
    }
}

pub fn iron_params(sink_strength: f64) -> NetworkParams {
    NetworkParams {
        material: MaterialKind::Iron,
        max_helium: 2,
        max_vacancy: 6,
        max_interstitial: 2,
        sink_strength,
        ..Default::default()
    }
}

pub fn build(params: &NetworkParams) -> ReactionNetwork {
    init_logging();
    ReactionNetwork::new(params).expect("network construction failed")
}

/// Reproducible state: concentrations in [0.1, 1), moments within +-0.1 of them.
pub fn random_state(network: &ReactionNetwork, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = vec![0.0; network.dof()];
    for cluster in network.clusters() {
        let c0 = rng.gen_range(0.1..1.0);
        state[cluster.id] = c0;
        for slot in cluster.moment_ids.iter().flatten() {
            state[*slot] = c0 * rng.gen_range(-0.1..0.1);
        }
    }
    state
}

pub fn assert_close(actual: f64, expected: f64, rel: f64, what: &str) {
    let scale = actual.abs().max(expected.abs());
    assert!(
        (actual - expected).abs() <= rel * scale,
        "{}: {} vs {} (rel tol {})",
        what,
        actual,
        expected,
        rel
    );
}
