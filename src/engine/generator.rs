//! Recursive phase-space partition producing the cluster set.

use log::{debug, warn};

use crate::core::domain::{ClusterProperties, Composition};
use crate::core::error::NetworkResult;
use crate::core::spatial::Region;
use crate::materials::Material;

/// A cluster before ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSeed {
    pub region: Region,
    pub composition: Composition,
    pub properties: ClusterProperties,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    pub visited: usize,
    pub admitted: usize,
    pub grouped: usize,
    pub dropped_regions: usize,
    pub dropped_compositions: i64,
}

/// Physics of one admitted region.
///
/// Single compositions get the material's values; grouped regions are
/// evaluated at their rounded centroid and never migrate.
pub fn seed_for(material: &dyn Material, region: &Region) -> NetworkResult<ClusterSeed> {
    let space = material.phase_space();
    let point = if region.is_unit() {
        region.lo
    } else {
        region.representative()
    };
    let composition = space.to_composition(&point);
    // Round-trip check rejects points the axis set cannot express
    space.to_point(&composition)?;

    let properties = if region.is_unit() {
        ClusterProperties {
            formation_energy: material.formation_energy(&composition),
            migration_energy: material.migration_energy(&composition),
            diffusion_factor: material.diffusion_factor(&composition),
            reaction_radius: material.reaction_radius(&composition),
        }
    } else {
        ClusterProperties::immobile(
            material.formation_energy(&composition),
            material.reaction_radius(&composition),
        )
    };
    Ok(ClusterSeed {
        region: *region,
        composition,
        properties,
    })
}

/// Partitions `material.bounds()` into admissible regions.
///
/// Regions still only partly admissible once `refine` stops splitting them
/// are dropped and reported with `warn!`; they are never merged into a
/// neighbour.
pub fn generate(material: &dyn Material) -> NetworkResult<(Vec<ClusterSeed>, GeneratorStats)> {
    let mut seeds = Vec::new();
    let mut stats = GeneratorStats::default();
    visit(material, &material.bounds(), &mut seeds, &mut stats)?;

    debug!(
        "Generator visited {} regions, admitted {} ({} grouped), dropped {}",
        stats.visited, stats.admitted, stats.grouped, stats.dropped_regions
    );
    if stats.dropped_regions > 0 {
        warn!(
            "{}: {} partly admissible regions ({} compositions) dropped at minimum width",
            material.name(),
            stats.dropped_regions,
            stats.dropped_compositions
        );
    }
    Ok((seeds, stats))
}

fn visit(
    material: &dyn Material,
    region: &Region,
    seeds: &mut Vec<ClusterSeed>,
    stats: &mut GeneratorStats,
) -> NetworkResult<()> {
    stats.visited += 1;
    if !material.intersect(region) {
        return Ok(());
    }

    let children = region.bisect(&material.refine(region));
    if children.len() > 1 {
        for child in &children {
            visit(material, child, seeds, stats)?;
        }
        return Ok(());
    }

    if material.select(region) {
        seeds.push(seed_for(material, region)?);
        stats.admitted += 1;
        if !region.is_unit() {
            stats.grouped += 1;
        }
    } else {
        debug!("Dropping partly admissible region {}", region);
        stats.dropped_regions += 1;
        stats.dropped_compositions += region.volume();
    }
    Ok(())
}
