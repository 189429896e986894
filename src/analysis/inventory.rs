use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::core::domain::ClusterKind;
use crate::core::error::{NetworkError, NetworkResult};
use crate::core::spatial::MAX_AXES;
use crate::engine::flux::compute_fluxes;
use crate::engine::network::ReactionNetwork;
use crate::engine::rates::RateConstants;

/// Size and shape of a built network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub material: String,
    pub singles: usize,
    pub mixed: usize,
    pub supers: usize,
    pub dof: usize,
    pub productions: usize,
    pub dissociations: usize,
    pub nonzeros: usize,
    /// Compositions covered by all cluster regions together.
    pub represented: i64,
    /// Compositions in the widest super-cluster (1 without grouping).
    pub largest_group: i64,
}

impl NetworkStats {
    pub fn collect(network: &ReactionNetwork) -> Self {
        let count = |kind| network.clusters().iter().filter(|c| c.kind == kind).count();
        Self {
            material: network.material().name().to_string(),
            singles: count(ClusterKind::Single),
            mixed: count(ClusterKind::Mixed),
            supers: count(ClusterKind::Super),
            dof: network.dof(),
            productions: network.production_count(),
            dissociations: network.dissociation_count(),
            nonzeros: network.sparsity().nnz(),
            represented: network.clusters().iter().map(|c| c.volume()).sum(),
            largest_group: network.clusters().iter().map(|c| c.volume()).max().unwrap_or(0),
        }
    }
}

/// Signed defect content per axis held by `state`.
///
/// With concentrations this is the inventory (vacancies count positive,
/// interstitials negative on a folded axis); with a flux vector it is the
/// inventory's rate of change. Grouped clusters contribute
/// `|X| center_a L_0 + half_a S_a L_a`, which is exact for the linear
/// reconstruction inside the region.
pub fn content(network: &ReactionNetwork, state: &[f64]) -> NetworkResult<[f64; MAX_AXES]> {
    if state.len() != network.dof() {
        return Err(NetworkError::DimensionMismatch {
            what: "state",
            expected: network.dof(),
            actual: state.len(),
        });
    }
    let mut total = [0.0; MAX_AXES];
    for cluster in network.clusters() {
        let basis = network.basis(cluster.id);
        let l0 = state[cluster.id];
        for (a, t) in total.iter_mut().enumerate() {
            *t += basis.volume() * basis.center(a) * l0;
            if let Some(slot) = cluster.moment_ids[a] {
                *t += basis.half_width(a) * basis.norm(a) * state[slot];
            }
        }
    }
    Ok(total)
}

/// Rate of change of [`content`] under the reaction network alone.
///
/// Zero up to rounding whenever no sink is active: every production,
/// recombination and dissociation conserves signed content.
pub fn content_rate(
    network: &ReactionNetwork,
    rates: &RateConstants,
    concentrations: &[f64],
) -> NetworkResult<[f64; MAX_AXES]> {
    let mut flux = vec![0.0; network.dof()];
    compute_fluxes(network, rates, concentrations, &mut flux)?;
    content(network, &flux)
}

/// Total cluster number density: `sum_X |X| L_0`.
pub fn total_concentration(network: &ReactionNetwork, concentrations: &[f64]) -> f64 {
    network
        .clusters()
        .iter()
        .map(|c| c.volume() as f64 * concentrations.get(c.id).copied().unwrap_or(0.0))
        .sum()
}

/// Order-sensitive key over cluster regions and reaction topology.
///
/// Two networks built from the same parameters share a fingerprint;
/// any change in ids, regions or reaction partners changes it.
pub fn fingerprint(network: &ReactionNetwork) -> String {
    let mut hasher = DefaultHasher::new();
    for cluster in network.clusters() {
        cluster.id.hash(&mut hasher);
        cluster.region.hash(&mut hasher);
        cluster.composition.hash(&mut hasher);
        cluster.moment_ids.hash(&mut hasher);
    }
    for reaction in network.reactions() {
        format!("{:?}", reaction).hash(&mut hasher);
    }
    format!(
        "{}-{}-{}-{:016x}",
        network.material().name(),
        network.num_clusters(),
        network.reactions().len(),
        hasher.finish()
    )
}
