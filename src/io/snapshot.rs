use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::domain::{ClusterKind, ClusterProperties, Composition, NetworkParams};
use crate::core::error::{NetworkError, NetworkResult};
use crate::core::spatial::{Region, MAX_AXES};
use crate::engine::generator::ClusterSeed;
use crate::engine::network::{NetworkBuilder, ReactionNetwork};
use crate::materials::build_material;

/// Flat description of one cluster, enough to rebuild it without physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: usize,
    pub kind: ClusterKind,
    /// Inclusive lower corner, one entry per phase-space axis.
    pub lo: Vec<i64>,
    /// Exclusive upper corner.
    pub hi: Vec<i64>,
    pub composition: Composition,
    pub formation_energy: f64,
    /// `None` for immobile clusters.
    pub migration_energy: Option<f64>,
    pub diffusion_factor: f64,
    pub reaction_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub params: NetworkParams,
    pub dof: usize,
    pub clusters: Vec<ClusterRecord>,
}

pub fn snapshot(network: &ReactionNetwork) -> NetworkSnapshot {
    let dim = network.material().phase_space().dim();
    let clusters = network
        .clusters()
        .iter()
        .map(|c| ClusterRecord {
            id: c.id,
            kind: c.kind,
            lo: c.region.lo[..dim].to_vec(),
            hi: c.region.hi[..dim].to_vec(),
            composition: c.composition,
            formation_energy: c.properties.formation_energy,
            migration_energy: Some(c.properties.migration_energy).filter(|e| e.is_finite()),
            diffusion_factor: c.properties.diffusion_factor,
            reaction_radius: c.properties.reaction_radius,
        })
        .collect();
    NetworkSnapshot {
        params: network.params().clone(),
        dof: network.dof(),
        clusters,
    }
}

impl ClusterRecord {
    fn region(&self, dim: usize) -> NetworkResult<Region> {
        if self.lo.len() != dim || self.hi.len() != dim {
            return Err(NetworkError::DimensionMismatch {
                what: "cluster record bounds",
                expected: dim,
                actual: self.lo.len().max(self.hi.len()),
            });
        }
        let mut lo = [0; MAX_AXES];
        let mut hi = [1; MAX_AXES];
        lo[..dim].copy_from_slice(&self.lo);
        hi[..dim].copy_from_slice(&self.hi);
        Ok(Region::new(lo, hi))
    }
}

impl NetworkSnapshot {
    /// Rebuilds the network from the stored cluster list.
    ///
    /// Cluster physics come from the records; reactions, coefficients and
    /// binding energies are rebuilt by the material. Fails if the records
    /// do not reproduce their own ids.
    pub fn restore(&self) -> NetworkResult<ReactionNetwork> {
        let material = build_material(&self.params)?;
        let dim = material.phase_space().dim();
        let mut builder = NetworkBuilder::with_material(&self.params, material);

        let mut records: Vec<&ClusterRecord> = self.clusters.iter().collect();
        records.sort_by_key(|r| r.id);
        for record in &records {
            builder.add(ClusterSeed {
                region: record.region(dim)?,
                composition: record.composition,
                properties: ClusterProperties {
                    formation_energy: record.formation_energy,
                    migration_energy: record.migration_energy.unwrap_or(f64::INFINITY),
                    diffusion_factor: record.diffusion_factor,
                    reaction_radius: record.reaction_radius,
                },
            })?;
        }
        let network = builder.finish()?;

        if network.dof() != self.dof {
            return Err(NetworkError::DimensionMismatch {
                what: "restored degrees of freedom",
                expected: self.dof,
                actual: network.dof(),
            });
        }
        for (record, cluster) in records.iter().zip(network.clusters()) {
            if record.id != cluster.id || record.kind != cluster.kind {
                return Err(NetworkError::Config(format!(
                    "snapshot record {} ({}) restored as cluster {} ({:?})",
                    record.id,
                    record.composition,
                    cluster.id,
                    cluster.kind
                )));
            }
        }
        Ok(network)
    }
}

pub fn write_json(path: impl AsRef<Path>, snapshot: &NetworkSnapshot) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create snapshot file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), snapshot)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
    Ok(())
}

pub fn read_json(path: impl AsRef<Path>) -> Result<NetworkSnapshot> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot file {}", path.display()))?;
    let snapshot = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Malformed snapshot in {}", path.display()))?;
    Ok(snapshot)
}

#[derive(Debug, Serialize)]
struct ClusterRow<'a> {
    id: usize,
    name: &'a str,
    kind: ClusterKind,
    compositions: i64,
    formation_energy: f64,
    migration_energy: f64,
    diffusion_factor: f64,
    reaction_radius: f64,
}

/// One CSV row per cluster, for inspection in a spreadsheet.
pub fn write_cluster_table(path: impl AsRef<Path>, network: &ReactionNetwork) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create cluster table {}", path.display()))?;
    for cluster in network.clusters() {
        let name = cluster.name();
        writer
            .serialize(ClusterRow {
                id: cluster.id,
                name: &name,
                kind: cluster.kind,
                compositions: cluster.volume(),
                formation_energy: cluster.properties.formation_energy,
                migration_energy: cluster.properties.migration_energy,
                diffusion_factor: cluster.properties.diffusion_factor,
                reaction_radius: cluster.properties.reaction_radius,
            })
            .with_context(|| format!("Failed to write row for {}", name))?;
    }
    writer.flush()?;
    Ok(())
}
