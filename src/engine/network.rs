use std::collections::HashMap;
use std::sync::Arc;

use log::info;

use crate::core::domain::{Cluster, ClusterKind, Composition, NetworkParams};
use crate::core::error::{NetworkError, NetworkResult};
use crate::core::spatial::{Point, RegionTree, MAX_AXES};
use crate::engine::flux::{cluster_connectivity, SparsityPattern};
use crate::engine::generator::{generate, ClusterSeed, GeneratorStats};
use crate::engine::overlap::MomentBasis;
use crate::engine::reactions::{build_reactions, ClusterLinks, Reaction};
use crate::materials::{build_material, Material};

/// Collects cluster seeds and turns them into a [`ReactionNetwork`].
///
/// Ids are only assigned in [`NetworkBuilder::finish`]: single and mixed
/// clusters first in insertion order, then super-clusters, then one moment
/// slot per grouped axis of each super-cluster.
pub struct NetworkBuilder {
    params: NetworkParams,
    material: Arc<dyn Material>,
    seeds: Vec<ClusterSeed>,
    units: HashMap<Composition, usize>,
}

impl NetworkBuilder {
    pub fn new(params: &NetworkParams) -> NetworkResult<Self> {
        Ok(Self::with_material(params, build_material(params)?))
    }

    pub fn with_material(params: &NetworkParams, material: Arc<dyn Material>) -> Self {
        Self {
            params: params.clone(),
            material,
            seeds: Vec::new(),
            units: HashMap::new(),
        }
    }

    pub fn material(&self) -> &Arc<dyn Material> {
        &self.material
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Adds one cluster. A second cluster at an owned composition is fatal.
    pub fn add(&mut self, seed: ClusterSeed) -> NetworkResult<()> {
        let space = self.material.phase_space();
        if seed.region.is_empty() {
            return Err(NetworkError::InvalidComposition(format!(
                "empty region {} for {}",
                seed.region, seed.composition
            )));
        }
        let point = space.to_point(&seed.composition)?;
        if seed.region.is_unit() {
            if point != seed.region.lo {
                return Err(NetworkError::InvalidComposition(format!(
                    "{} does not sit at {}",
                    seed.composition, seed.region
                )));
            }
            if self.units.contains_key(&seed.composition) {
                return Err(NetworkError::DuplicateCluster {
                    composition: seed.composition.to_string(),
                    region: seed.region.to_string(),
                });
            }
            self.units.insert(seed.composition, self.seeds.len());
        }
        self.seeds.push(seed);
        Ok(())
    }

    /// Runs the recursive generator and adds every admitted region.
    pub fn generate(&mut self) -> NetworkResult<GeneratorStats> {
        let (seeds, stats) = generate(self.material.as_ref())?;
        for seed in seeds {
            self.add(seed)?;
        }
        Ok(stats)
    }

    /// Assigns ids and moment slots, then builds every reaction.
    pub fn finish(self) -> NetworkResult<ReactionNetwork> {
        let Self {
            params,
            material,
            seeds,
            ..
        } = self;
        if seeds.is_empty() {
            return Err(NetworkError::EmptyNetwork(material.name().to_string()));
        }

        let (units, groups): (Vec<_>, Vec<_>) = seeds.into_iter().partition(|s| s.region.is_unit());
        let num_clusters = units.len() + groups.len();
        let mut next_moment = num_clusters;

        let mut clusters = Vec::with_capacity(num_clusters);
        for (id, seed) in units.into_iter().chain(groups).enumerate() {
            let mut moment_ids = [None; MAX_AXES];
            let kind = if !seed.region.is_unit() {
                for a in seed.region.grouped_axes() {
                    moment_ids[a] = Some(next_moment);
                    next_moment += 1;
                }
                ClusterKind::Super
            } else if seed.composition.is_mixed() {
                ClusterKind::Mixed
            } else {
                ClusterKind::Single
            };
            clusters.push(Cluster {
                id,
                kind,
                region: seed.region,
                composition: seed.composition,
                properties: seed.properties,
                moment_ids,
            });
        }
        let dof = next_moment;

        let lookup: HashMap<Composition, usize> = clusters
            .iter()
            .filter(|c| !c.is_super())
            .map(|c| (c.composition, c.id))
            .collect();
        let bases: Vec<MomentBasis> = clusters
            .iter()
            .map(|c| MomentBasis::new(&c.region))
            .collect();
        let tree = RegionTree::build(clusters.iter().map(|c| (c.region, c.id)).collect())?;

        let set = build_reactions(material.as_ref(), &clusters, &bases, &tree, &lookup)?;
        let sinks = clusters
            .iter()
            .map(|c| material.sink_strength(&c.composition))
            .collect();

        let mut rows = vec![Vec::new(); dof];
        for cluster in &clusters {
            let columns = cluster_connectivity(&clusters, &set.links, cluster.id);
            for (_, slot) in cluster.state_slots() {
                rows[slot] = columns.clone();
            }
        }
        let sparsity = SparsityPattern::from_rows(rows);

        let network = ReactionNetwork {
            params,
            material,
            clusters,
            bases,
            lookup,
            tree,
            reactions: set.reactions,
            links: set.links,
            sinks,
            dof,
            sparsity,
        };
        network.log_summary();
        Ok(network)
    }
}

/// The cluster set, its reactions and the static Jacobian pattern.
///
/// Read-only once built; rate constants live in
/// [`crate::engine::rates::RateConstants`] so one network serves any
/// number of grid points and temperatures concurrently.
pub struct ReactionNetwork {
    params: NetworkParams,
    material: Arc<dyn Material>,
    clusters: Vec<Cluster>,
    bases: Vec<MomentBasis>,
    lookup: HashMap<Composition, usize>,
    tree: RegionTree,
    reactions: Vec<Reaction>,
    links: Vec<ClusterLinks>,
    sinks: Vec<f64>,
    dof: usize,
    sparsity: SparsityPattern,
}

impl ReactionNetwork {
    /// Generates the cluster set from `params` and builds all reactions.
    pub fn new(params: &NetworkParams) -> NetworkResult<Self> {
        let mut builder = NetworkBuilder::new(params)?;
        builder.generate()?;
        builder.finish()
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, id: usize) -> &Cluster {
        &self.clusters[id]
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Concentration slots plus moment slots.
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// Single or mixed cluster with exactly this composition.
    pub fn find(&self, composition: &Composition) -> Option<&Cluster> {
        self.lookup.get(composition).map(|&id| &self.clusters[id])
    }

    /// Cluster whose region holds `composition`, super-clusters included.
    pub fn find_owner(&self, composition: &Composition) -> Option<&Cluster> {
        let point = self.material.phase_space().to_point(composition).ok()?;
        self.find_point(&point)
    }

    pub fn find_point(&self, point: &Point) -> Option<&Cluster> {
        self.tree.find(point).map(|id| &self.clusters[id])
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn links(&self, id: usize) -> &ClusterLinks {
        &self.links[id]
    }

    pub fn basis(&self, id: usize) -> &MomentBasis {
        &self.bases[id]
    }

    /// Sink coefficient of cluster `id` (0 for materials without sinks).
    pub fn sink(&self, id: usize) -> f64 {
        self.sinks[id]
    }

    pub fn sparsity(&self) -> &SparsityPattern {
        &self.sparsity
    }

    /// Sorted columns every row of cluster `id` touches.
    pub fn connectivity(&self, id: usize) -> &[usize] {
        self.sparsity.row(id)
    }

    pub fn production_count(&self) -> usize {
        self.reactions.iter().filter(|r| r.is_production()).count()
    }

    pub fn dissociation_count(&self) -> usize {
        self.reactions.len() - self.production_count()
    }

    fn log_summary(&self) {
        let count = |kind| self.clusters.iter().filter(|c| c.kind == kind).count();
        info!(
            "Network {}: {} clusters ({} single, {} mixed, {} super), {} DOF, \
             {} productions, {} dissociations, {} non-zeros",
            self.material.name(),
            self.clusters.len(),
            count(ClusterKind::Single),
            count(ClusterKind::Mixed),
            count(ClusterKind::Super),
            self.dof,
            self.production_count(),
            self.dissociation_count(),
            self.sparsity.nnz()
        );
    }
}
