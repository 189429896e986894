//! Material capability interface and the shared phase-space rules.
//!
//! A material owns its axis set, decides which compositions exist and how
//! phase space is partitioned, and supplies the per-cluster physics.

use std::sync::Arc;

use crate::core::domain::{Composition, GroupingParams, MaterialKind, NetworkParams, Species};
use crate::core::error::NetworkResult;
use crate::core::spatial::{Axis, AxisMask, PhaseSpace, Point, Region, MAX_AXES};

pub mod iron;
pub mod tungsten;
pub mod xenon;

pub use iron::Iron;
pub use tungsten::Tungsten;
pub use xenon::Xenon;

/// Per-material behaviour consumed by the generator, the reaction builder
/// and the rate evaluator.
pub trait Material: Send + Sync {
    fn name(&self) -> &str;

    fn phase_space(&self) -> &PhaseSpace;

    /// Box spanning every composition the material can admit.
    fn bounds(&self) -> Region;

    /// Cheap pre-filter: does `region` hold at least one admissible point?
    fn intersect(&self, region: &Region) -> bool;

    /// Is every point of `region` admissible, so it may stand as one cluster?
    fn select(&self, region: &Region) -> bool;

    /// Axes along which `region` must be bisected before it can be admitted.
    fn refine(&self, region: &Region) -> AxisMask;

    // Physics, evaluated at a concrete composition
    fn formation_energy(&self, composition: &Composition) -> f64;
    fn migration_energy(&self, composition: &Composition) -> f64;
    fn diffusion_factor(&self, composition: &Composition) -> f64;
    fn reaction_radius(&self, composition: &Composition) -> f64;

    /// Extra capture radius added to every encounter (nm).
    fn core_radius(&self) -> f64 {
        0.0
    }

    /// Elementary cell volume Omega (nm^3).
    fn atomic_volume(&self) -> f64;

    /// Monomers a parent may shed, in emission order.
    fn emitted_monomers(&self) -> Vec<Composition>;

    /// Whether `parent` has a dissociation channel emitting `monomer`.
    fn can_emit(&self, parent: &Composition, monomer: &Composition) -> bool;

    /// Binding energy of `monomer` to `remainder` inside `parent`.
    fn binding_energy(
        &self,
        parent: &Composition,
        monomer: &Composition,
        remainder: &Composition,
    ) -> f64 {
        self.formation_energy(monomer) + self.formation_energy(remainder)
            - self.formation_energy(parent)
    }

    /// Loss coefficient `s` in the sink term `-s * D * c` (nm^-2).
    fn sink_strength(&self, _composition: &Composition) -> f64 {
        0.0
    }

    fn dissociation_enabled(&self) -> bool;
}

/// Validates `params` and instantiates the configured material.
pub fn build_material(params: &NetworkParams) -> NetworkResult<Arc<dyn Material>> {
    params.validate()?;
    let material: Arc<dyn Material> = match params.material {
        MaterialKind::Tungsten => Arc::new(Tungsten::new(params)?),
        MaterialKind::Iron => Arc::new(Iron::new(params)?),
        MaterialKind::Xenon => Arc::new(Xenon::new(params)?),
    };
    log::debug!(
        "Material {} with bounds {}",
        material.name(),
        material.bounds()
    );
    Ok(material)
}

// --- Grouping Schedule ---

/// Super-cluster bin widths along a material's primary axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSchedule {
    pub start: i64,
    pub width: f64,
    pub growth: f64,
    pub min_width: i64,
}

impl BinSchedule {
    pub fn from_params(grouping: Option<&GroupingParams>) -> Option<Self> {
        grouping.map(|g| Self {
            start: i64::from(g.start),
            width: f64::from(g.width),
            growth: g.growth,
            min_width: i64::from(g.min_width),
        })
    }

    /// Widest bin allowed for a region whose primary coordinate starts at `x`.
    pub fn allowed_width(&self, x: i64) -> i64 {
        if x < self.start {
            return 1;
        }
        let scaled = self.width * (x as f64 / self.start as f64).powf(self.growth);
        (scaled.floor() as i64).max(1)
    }
}

/// Shared refinement rule.
///
/// Below the grouping start (or with grouping off) every axis is split down
/// to single points. Above it an axis is split while it is wider than the
/// schedule allows at the region's lower primary coordinate. A region that
/// already fits the schedule but is only partly admissible keeps splitting
/// until it reaches the minimum width.
pub fn refine_by_schedule(
    region: &Region,
    dim: usize,
    primary: usize,
    schedule: Option<&BinSchedule>,
    fully_admissible: bool,
) -> AxisMask {
    let mut mask = [false; MAX_AXES];
    let x = region.lo[primary];
    match schedule {
        Some(s) if x >= s.start => {
            let allowed = s.allowed_width(x);
            for (a, m) in mask.iter_mut().enumerate().take(dim) {
                *m = region.width(a) > allowed;
            }
            if !mask.iter().any(|&m| m) && !fully_admissible {
                for (a, m) in mask.iter_mut().enumerate().take(dim) {
                    *m = region.width(a) > s.min_width;
                }
            }
        }
        _ => {
            for (a, m) in mask.iter_mut().enumerate().take(dim) {
                *m = region.width(a) > 1;
            }
        }
    }
    mask
}

// --- Helium / Vacancy / Interstitial Space ---

/// Two-axis space shared by the bcc metals: helium on axis 0, vacancies
/// (positive) folded against interstitials (negative) on axis 1.
///
/// Admissible points are pure He_n, V_n and I_n up to their maxima, plus
/// He_m V_n with `m <= slope * n + intercept`.
#[derive(Debug, Clone)]
pub struct HeVSpace {
    space: PhaseSpace,
    pub max_helium: i64,
    pub max_vacancy: i64,
    pub max_interstitial: i64,
    pub slope: i64,
    pub intercept: i64,
}

pub const HELIUM_AXIS: usize = 0;
pub const DEFECT_AXIS: usize = 1;

impl HeVSpace {
    pub fn new(params: &NetworkParams, slope: i64, intercept: i64) -> NetworkResult<Self> {
        let space = PhaseSpace::new(vec![
            Axis::plain(Species::Helium),
            Axis::folded(Species::Vacancy, Species::Interstitial),
        ])?;
        Ok(Self {
            space,
            max_helium: i64::from(params.max_helium),
            max_vacancy: i64::from(params.max_vacancy),
            max_interstitial: i64::from(params.max_interstitial),
            slope,
            intercept,
        })
    }

    pub fn phase_space(&self) -> &PhaseSpace {
        &self.space
    }

    /// Largest helium count in a cluster with `n` vacancies.
    fn helium_cap(&self, n: i64) -> i64 {
        if self.max_helium == 0 {
            0
        } else if n == 0 {
            self.max_helium
        } else {
            self.slope * n + self.intercept
        }
    }

    pub fn bounds(&self) -> Region {
        let he_top = self.helium_cap(self.max_vacancy).max(self.max_helium);
        Region::from_inclusive(&[
            (0, he_top),
            (-self.max_interstitial, self.max_vacancy),
        ])
    }

    pub fn is_admissible(&self, p: &Point) -> bool {
        let (h, x) = (p[HELIUM_AXIS], p[DEFECT_AXIS]);
        if p[2..].iter().any(|&v| v != 0) || h < 0 {
            return false;
        }
        match x {
            0 => h >= 1 && h <= self.max_helium,
            x if x < 0 => h == 0 && -x <= self.max_interstitial,
            x => x <= self.max_vacancy && h <= self.helium_cap(x),
        }
    }

    /// Number of admissible points in `region`, counted column by column.
    pub fn count_admissible(&self, region: &Region) -> i64 {
        if region.is_empty() || (2..MAX_AXES).any(|a| region.lo[a] > 0 || region.hi[a] <= 0) {
            return 0;
        }
        let (h_lo, h_hi) = (region.lo[HELIUM_AXIS].max(0), region.hi[HELIUM_AXIS]);
        let x_lo = region.lo[DEFECT_AXIS].max(-self.max_interstitial);
        let x_hi = region.hi[DEFECT_AXIS].min(self.max_vacancy + 1);

        let mut count = 0;
        for x in x_lo..x_hi {
            // Admissible helium counts in this column, inclusive
            let (lo, hi) = match x {
                0 => (1, self.max_helium),
                x if x < 0 => (0, 0),
                x => (0, self.helium_cap(x)),
            };
            let lo = lo.max(h_lo);
            let hi = hi.min(h_hi - 1);
            if hi >= lo {
                count += hi - lo + 1;
            }
        }
        count
    }

    pub fn intersect(&self, region: &Region) -> bool {
        self.count_admissible(region) > 0
    }

    pub fn select(&self, region: &Region) -> bool {
        self.count_admissible(region) == region.volume()
    }
}

/// Reaction radius of a bcc defect cluster of `n` vacancies or interstitials.
///
/// `sqrt(3)/4 a + cbrt(3 a^3 n / 8 pi) - cbrt(3 a^3 / 8 pi)`.
pub fn bcc_loop_radius(n: f64, lattice: f64) -> f64 {
    use crate::core::chemistry::PI;
    let a3 = lattice.powi(3);
    3f64.sqrt() / 4.0 * lattice + (3.0 * a3 * n / (8.0 * PI)).cbrt()
        - (3.0 * a3 / (8.0 * PI)).cbrt()
}

/// Reaction radius of a helium bubble of `n` atoms in a bcc lattice.
pub fn bcc_helium_radius(n: f64, lattice: f64) -> f64 {
    use crate::core::chemistry::PI;
    let a3 = lattice.powi(3);
    0.3 + (3.0 * a3 * n / (8.0 * PI)).cbrt() - (3.0 * a3 / (8.0 * PI)).cbrt()
}
