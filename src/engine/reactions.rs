//! Reaction arena, the per-cluster reaction records, and the builder that
//! enumerates productions and their reverse dissociations.

use std::collections::HashMap;

use log::debug;

use crate::core::domain::{Cluster, Composition};
use crate::core::error::NetworkResult;
use crate::core::spatial::{Point, Region, RegionTree, MAX_AXES};
use crate::engine::overlap::{coefficients, MomentBasis, MomentMatrix};
use crate::materials::Material;

/// One rate-carrying event. Clusters refer to reactions by arena index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reaction {
    /// `first + second -> products`. `first` is the grouped operand when
    /// there is one.
    Production { first: usize, second: usize },
    /// `dissociating -> first + second`, `first` being the emitted monomer.
    Dissociation {
        dissociating: usize,
        first: usize,
        second: usize,
        /// Arena index of `first + second -> dissociating`.
        reverse: usize,
        binding_energy: f64,
    },
}

impl Reaction {
    pub fn is_production(&self) -> bool {
        matches!(self, Reaction::Production { .. })
    }
}

// --- Per-cluster records ---

/// This cluster is produced by `first + second`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionPair {
    pub reaction: usize,
    pub first: usize,
    pub second: usize,
    pub coefs: MomentMatrix,
}

/// This cluster is consumed by combining with `partner`.
#[derive(Debug, Clone, PartialEq)]
pub struct CombiningCluster {
    pub reaction: usize,
    pub partner: usize,
    pub coefs: MomentMatrix,
}

/// This cluster is released when `parent` dissociates.
#[derive(Debug, Clone, PartialEq)]
pub struct DissociatingPair {
    pub reaction: usize,
    pub parent: usize,
    pub coefs: MomentMatrix,
}

/// This cluster emits `first` and leaves `second`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionPair {
    pub reaction: usize,
    pub first: usize,
    pub second: usize,
    pub coefs: MomentMatrix,
}

/// Every reaction one cluster takes part in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterLinks {
    pub production: Vec<ProductionPair>,
    pub combining: Vec<CombiningCluster>,
    pub dissociating: Vec<DissociatingPair>,
    pub emission: Vec<EmissionPair>,
}

trait Record {
    fn reaction(&self) -> usize;
    fn coefs(&self) -> &MomentMatrix;
    fn coefs_mut(&mut self) -> &mut MomentMatrix;
}

macro_rules! impl_record {
    ($($t:ty),*) => {$(
        impl Record for $t {
            fn reaction(&self) -> usize {
                self.reaction
            }
            fn coefs(&self) -> &MomentMatrix {
                &self.coefs
            }
            fn coefs_mut(&mut self) -> &mut MomentMatrix {
                &mut self.coefs
            }
        }
    )*};
}

impl_record!(ProductionPair, CombiningCluster, DissociatingPair, EmissionPair);

/// Records of the same reaction accumulate into one entry, so a cluster
/// that appears twice in a reaction (A + A, A -> A1 + A1) counts twice.
fn merge<R: Record>(list: &mut Vec<R>, record: R) {
    let reaction = record.reaction();
    match list.iter_mut().rev().find(|r| r.reaction() == reaction) {
        Some(existing) => *existing.coefs_mut() += *record.coefs(),
        None => list.push(record),
    }
}

// --- Builder ---

#[derive(Debug, Clone, Default)]
pub struct ReactionSet {
    pub reactions: Vec<Reaction>,
    pub links: Vec<ClusterLinks>,
}

#[derive(Debug, Default)]
struct BuildStats {
    productionless_pairs: usize,
    recombinations: usize,
    missing_reverse: usize,
    missing_monomers: usize,
}

fn negate(p: &Point) -> Point {
    let mut out = *p;
    for v in out.iter_mut() {
        *v = -*v;
    }
    out
}

struct Builder<'a> {
    clusters: &'a [Cluster],
    bases: &'a [MomentBasis],
    tree: &'a RegionTree,
    set: ReactionSet,
    production_ids: HashMap<(usize, usize), usize>,
    stats: BuildStats,
    hits: Vec<usize>,
}

impl<'a> Builder<'a> {
    fn production_id(&mut self, slot: &mut Option<usize>, first: usize, second: usize) -> usize {
        if let Some(id) = *slot {
            return id;
        }
        let id = self.set.reactions.len();
        self.set.reactions.push(Reaction::Production { first, second });
        self.production_ids.insert((first.min(second), first.max(second)), id);
        *slot = Some(id);
        id
    }

    fn combine(&mut self, reaction: usize, g: &Cluster, s: &Cluster, q: &Region) {
        let bases = self.bases;
        let (bg, bs) = (&bases[g.id], &bases[s.id]);
        let zero = [0; MAX_AXES];
        merge(
            &mut self.set.links[g.id].combining,
            CombiningCluster {
                reaction,
                partner: s.id,
                coefs: coefficients(bg, &zero, bg, q),
            },
        );
        merge(
            &mut self.set.links[s.id].combining,
            CombiningCluster {
                reaction,
                partner: g.id,
                coefs: coefficients(bs, &zero, bg, q),
            },
        );
    }

    /// All products of the pair `(a, b)`, at most one of them grouped.
    fn productions(&mut self, a: &Cluster, b: &Cluster) {
        let (g, s) = match (a.is_super(), b.is_super()) {
            (true, true) => return,
            (true, false) => (a, b),
            (false, true) => (b, a),
            (false, false) if a.id <= b.id => (a, b),
            (false, false) => (b, a),
        };
        let (clusters, bases) = (self.clusters, self.bases);
        let shift = s.region.lo;
        let back = negate(&shift);
        let target = g.region.shifted(&shift);
        let mut reaction = None;

        if target.contains(&[0; MAX_AXES]) {
            let id = self.production_id(&mut reaction, g.id, s.id);
            self.combine(id, g, s, &Region::unit(back));
            self.stats.recombinations += 1;
        }

        let mut hits = std::mem::take(&mut self.hits);
        hits.clear();
        self.tree.query(&target, &mut hits);
        for &p in &hits {
            let Some(q) = g.region.intersection(&clusters[p].region.shifted(&back)) else {
                continue;
            };
            let id = self.production_id(&mut reaction, g.id, s.id);
            let coefs = coefficients(&bases[p], &shift, &bases[g.id], &q);
            merge(
                &mut self.set.links[p].production,
                ProductionPair {
                    reaction: id,
                    first: g.id,
                    second: s.id,
                    coefs,
                },
            );
            self.combine(id, g, s, &q);
        }
        self.hits = hits;

        if reaction.is_none() {
            self.stats.productionless_pairs += 1;
        }
    }

    /// Every channel `parent -> monomer + remainder` whose reverse exists.
    fn dissociations(
        &mut self,
        material: &dyn Material,
        parent: &Cluster,
        monomer: &Cluster,
        m: &Point,
    ) -> NetworkResult<()> {
        let space = material.phase_space();
        let back = negate(m);
        let target = parent.region.shifted(&back);

        let (clusters, bases) = (self.clusters, self.bases);
        let mut hits = std::mem::take(&mut self.hits);
        hits.clear();
        self.tree.query(&target, &mut hits);
        for &r in &hits {
            let Some(q) = parent.region.intersection(&clusters[r].region.shifted(m)) else {
                continue;
            };
            let key = (monomer.id.min(r), monomer.id.max(r));
            let Some(&reverse) = self.production_ids.get(&key) else {
                self.stats.missing_reverse += 1;
                continue;
            };

            // Binding energy of the representative parent composition in `q`
            let p_star = q.representative();
            let mut r_star = p_star;
            for a in 0..MAX_AXES {
                r_star[a] -= m[a];
            }
            let binding_energy = material.binding_energy(
                &space.to_composition(&p_star),
                &space.to_composition(m),
                &space.to_composition(&r_star),
            );

            let id = self.set.reactions.len();
            self.set.reactions.push(Reaction::Dissociation {
                dissociating: parent.id,
                first: monomer.id,
                second: r,
                reverse,
                binding_energy,
            });

            let bp = &bases[parent.id];
            let zero = [0; MAX_AXES];
            merge(
                &mut self.set.links[parent.id].emission,
                EmissionPair {
                    reaction: id,
                    first: monomer.id,
                    second: r,
                    coefs: coefficients(bp, &zero, bp, &q),
                },
            );
            merge(
                &mut self.set.links[r].dissociating,
                DissociatingPair {
                    reaction: id,
                    parent: parent.id,
                    coefs: coefficients(&bases[r], &back, bp, &q),
                },
            );
            merge(
                &mut self.set.links[monomer.id].dissociating,
                DissociatingPair {
                    reaction: id,
                    parent: parent.id,
                    coefs: coefficients(&bases[monomer.id], &zero, bp, &q),
                },
            );
        }
        self.hits = hits;
        Ok(())
    }
}

/// Enumerates every production and dissociation over a finished cluster set.
///
/// `clusters[i].id == i` and `bases[i]` is the moment basis of cluster `i`.
pub fn build_reactions(
    material: &dyn Material,
    clusters: &[Cluster],
    bases: &[MomentBasis],
    tree: &RegionTree,
    lookup: &HashMap<Composition, usize>,
) -> NetworkResult<ReactionSet> {
    let mut builder = Builder {
        clusters,
        bases,
        tree,
        set: ReactionSet {
            reactions: Vec::new(),
            links: vec![ClusterLinks::default(); clusters.len()],
        },
        production_ids: HashMap::new(),
        stats: BuildStats::default(),
        hits: Vec::new(),
    };

    // Productions: every mobile cluster against every partner, each pair once
    let mobile: Vec<&Cluster> = clusters.iter().filter(|c| c.is_mobile()).collect();
    for m in &mobile {
        for c in clusters {
            if c.is_mobile() && c.id < m.id {
                continue;
            }
            builder.productions(m, c);
        }
    }
    let production_count = builder.set.reactions.len();

    // Dissociations: reverse of an existing production only
    let space = material.phase_space();
    let monomers = material.emitted_monomers();
    for parent in clusters {
        for mc in &monomers {
            let Some(&mid) = lookup.get(mc) else {
                builder.stats.missing_monomers += 1;
                continue;
            };
            if mid == parent.id || !material.can_emit(&parent.composition, mc) {
                continue;
            }
            let m = space.to_point(mc)?;
            builder.dissociations(material, parent, &clusters[mid], &m)?;
        }
    }

    let stats = &builder.stats;
    debug!(
        "Built {} productions ({} recombination pieces, {} pairs without product) \
         and {} dissociations ({} without reverse, {} absent monomers)",
        production_count,
        stats.recombinations,
        stats.productionless_pairs,
        builder.set.reactions.len() - production_count,
        stats.missing_reverse,
        stats.missing_monomers
    );
    Ok(builder.set)
}
