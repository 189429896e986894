use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{NetworkError, NetworkResult};
use crate::core::spatial::{Region, MAX_AXES};

// --- Constants ---
pub const NUM_SPECIES: usize = 4;

// --- Chemical Types ---

/// A defect species counted along one composition axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Helium,
    Xenon,
    Vacancy,
    Interstitial,
}

impl Species {
    pub const ALL: [Species; NUM_SPECIES] = [
        Species::Helium,
        Species::Xenon,
        Species::Vacancy,
        Species::Interstitial,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Species::Helium => "He",
            Species::Xenon => "Xe",
            Species::Vacancy => "V",
            Species::Interstitial => "I",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Identity of a single (non-grouped) cluster: one count per species.
///
/// Counts are unsigned, so a negative amount can never be represented; the
/// signed view used for reaction arithmetic lives in [`crate::core::spatial::PhaseSpace`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Composition {
    counts: [u32; NUM_SPECIES],
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pure cluster of `n` units of `species`.
    pub fn single(species: Species, n: u32) -> Self {
        Self::new().with(species, n)
    }

    pub fn with(mut self, species: Species, n: u32) -> Self {
        self.counts[species.index()] = n;
        self
    }

    #[inline]
    pub fn get(&self, species: Species) -> u32 {
        self.counts[species.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn is_monomer(&self) -> bool {
        self.total() == 1
    }

    /// More than one species present.
    pub fn is_mixed(&self) -> bool {
        self.counts.iter().filter(|&&c| c > 0).count() > 1
    }

    /// Non-zero entries in canonical species order.
    pub fn iter(&self) -> impl Iterator<Item = (Species, u32)> + '_ {
        Species::ALL
            .iter()
            .map(move |&s| (s, self.get(s)))
            .filter(|&(_, n)| n > 0)
    }
}

impl fmt::Display for Composition {
    /// Canonical key form, e.g. `He_2V_3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("0");
        }
        for (species, n) in self.iter() {
            write!(f, "{}_{}", species, n)?;
        }
        Ok(())
    }
}

// --- The Core Entity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterKind {
    Single,
    Mixed,
    Super,
}

/// Physical parameters fixed at network construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterProperties {
    /// eV
    pub formation_energy: f64,
    /// eV, infinite when immobile
    pub migration_energy: f64,
    /// nm^2/s
    pub diffusion_factor: f64,
    /// nm
    pub reaction_radius: f64,
}

impl ClusterProperties {
    pub fn immobile(formation_energy: f64, reaction_radius: f64) -> Self {
        Self {
            formation_energy,
            migration_energy: f64::INFINITY,
            diffusion_factor: 0.0,
            reaction_radius,
        }
    }
}

/// One tracked species of the network.
///
/// `id` is the cluster's slot in the concentration vector. Super-clusters
/// additionally own one moment slot per grouped axis.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: usize,
    pub kind: ClusterKind,
    pub region: Region,
    /// Exact composition for single clusters, rounded centroid for super-clusters.
    pub composition: Composition,
    pub properties: ClusterProperties,
    pub moment_ids: [Option<usize>; MAX_AXES],
}

impl Cluster {
    pub fn is_super(&self) -> bool {
        self.kind == ClusterKind::Super
    }

    pub fn is_mobile(&self) -> bool {
        self.properties.diffusion_factor > 0.0 && self.properties.migration_energy.is_finite()
    }

    /// Number of compositions represented.
    pub fn volume(&self) -> i64 {
        self.region.volume()
    }

    /// State slot for basis function `basis` (0 = concentration, 1 + axis = moment).
    #[inline]
    pub fn column(&self, basis: usize) -> Option<usize> {
        if basis == 0 {
            Some(self.id)
        } else {
            self.moment_ids.get(basis - 1).copied().flatten()
        }
    }

    /// `(basis, slot)` for every state variable this cluster owns.
    pub fn state_slots(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        std::iter::once((0, self.id)).chain(
            self.moment_ids
                .iter()
                .enumerate()
                .filter_map(|(axis, slot)| slot.map(|s| (axis + 1, s))),
        )
    }

    pub fn name(&self) -> String {
        match self.kind {
            ClusterKind::Super => format!("Super{}", self.region),
            _ => self.composition.to_string(),
        }
    }
}

// --- Configuration Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Tungsten,
    Iron,
    Xenon,
}

/// Super-cluster grouping schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingParams {
    /// First grouped size along the material's primary axis.
    pub start: u32,
    /// Bin width at `start`.
    pub width: u32,
    /// Bin width grows as `width * (x / start)^growth`.
    pub growth: f64,
    /// Finest width a partially admissible region is refined to.
    pub min_width: u32,
}

impl Default for GroupingParams {
    fn default() -> Self {
        Self {
            start: 10,
            width: 4,
            growth: 1.0,
            min_width: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    pub material: MaterialKind,

    // Phase-space bounds
    pub max_helium: u32,
    pub max_vacancy: u32,
    pub max_interstitial: u32,
    pub max_xenon: u32,

    /// `None` tracks every composition individually.
    pub grouping: Option<GroupingParams>,

    pub dissociation_enabled: bool,
    /// Dislocation sink strength k^2 (nm^-2), used by materials with sinks.
    pub sink_strength: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            material: MaterialKind::Tungsten,
            max_helium: 8,
            max_vacancy: 20,
            max_interstitial: 5,
            max_xenon: 0,
            grouping: None,
            dissociation_enabled: true,
            sink_strength: 0.0,
        }
    }
}

impl NetworkParams {
    pub fn from_json(text: &str) -> NetworkResult<Self> {
        let params: NetworkParams = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file(path: impl AsRef<Path>) -> NetworkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Rejects physically inconsistent bounds before anything is built.
    pub fn validate(&self) -> NetworkResult<()> {
        if !self.sink_strength.is_finite() || self.sink_strength < 0.0 {
            return Err(NetworkError::Config(format!(
                "sink strength must be finite and non-negative, got {}",
                self.sink_strength
            )));
        }
        if let Some(g) = &self.grouping {
            if g.width == 0 {
                return Err(NetworkError::Config(
                    "grouping width must be positive".into(),
                ));
            }
            if g.min_width == 0 {
                return Err(NetworkError::Config(
                    "grouping minimum width must be positive".into(),
                ));
            }
            if g.start < 2 {
                return Err(NetworkError::Config(format!(
                    "grouping must start at size 2 or above, got {}",
                    g.start
                )));
            }
            if !g.growth.is_finite() || g.growth < 0.0 {
                return Err(NetworkError::Config(format!(
                    "grouping growth must be finite and non-negative, got {}",
                    g.growth
                )));
            }
        }
        Ok(())
    }
}
