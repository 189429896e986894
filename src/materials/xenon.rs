use crate::core::chemistry::equivalent_sphere_radius;
use crate::core::domain::{Composition, NetworkParams, Species};
use crate::core::error::{NetworkError, NetworkResult};
use crate::core::spatial::{Axis, AxisMask, PhaseSpace, Region};
use crate::materials::{refine_by_schedule, BinSchedule, Material};

const LATTICE: f64 = 0.547; // nm, UO2
const ATOMIC_VOLUME: f64 = 0.0409; // a^3 / 4

const XENON_FORMATION: f64 = 7.0;
const XENON_MIGRATION: f64 = 3.04;
const XENON_DIFFUSION: f64 = 7.6e8;

/// Fission-gas xenon in UO2: a single Xe axis, grouped in 1D.
pub struct Xenon {
    space: PhaseSpace,
    max_xenon: i64,
    schedule: Option<BinSchedule>,
    dissociation: bool,
}

impl Xenon {
    pub fn new(params: &NetworkParams) -> NetworkResult<Self> {
        if params.max_xenon == 0 {
            return Err(NetworkError::Config(
                "xenon network needs max_xenon >= 1".into(),
            ));
        }
        log::debug!(
            "Xenon in UO2 (a = {} nm) ignores helium/vacancy/interstitial bounds",
            LATTICE
        );
        Ok(Self {
            space: PhaseSpace::new(vec![Axis::plain(Species::Xenon)])?,
            max_xenon: i64::from(params.max_xenon),
            schedule: BinSchedule::from_params(params.grouping.as_ref()),
            dissociation: params.dissociation_enabled,
        })
    }

    fn count_admissible(&self, region: &Region) -> i64 {
        let off_axis = (1..region.lo.len()).any(|a| region.lo[a] > 0 || region.hi[a] <= 0);
        if region.is_empty() || off_axis {
            return 0;
        }
        let lo = region.lo[0].max(1);
        let hi = region.hi[0].min(self.max_xenon + 1);
        (hi - lo).max(0)
    }
}

impl Material for Xenon {
    fn name(&self) -> &str {
        "xenon"
    }

    fn phase_space(&self) -> &PhaseSpace {
        &self.space
    }

    fn bounds(&self) -> Region {
        Region::from_inclusive(&[(1, self.max_xenon)])
    }

    fn intersect(&self, region: &Region) -> bool {
        self.count_admissible(region) > 0
    }

    fn select(&self, region: &Region) -> bool {
        self.count_admissible(region) == region.volume()
    }

    fn refine(&self, region: &Region) -> AxisMask {
        refine_by_schedule(region, 1, 0, self.schedule.as_ref(), self.select(region))
    }

    fn formation_energy(&self, c: &Composition) -> f64 {
        XENON_FORMATION * f64::from(c.get(Species::Xenon)).powf(2.0 / 3.0)
    }

    fn migration_energy(&self, c: &Composition) -> f64 {
        if c.get(Species::Xenon) == 1 {
            XENON_MIGRATION
        } else {
            f64::INFINITY
        }
    }

    fn diffusion_factor(&self, c: &Composition) -> f64 {
        if c.get(Species::Xenon) == 1 {
            XENON_DIFFUSION
        } else {
            0.0
        }
    }

    fn reaction_radius(&self, c: &Composition) -> f64 {
        equivalent_sphere_radius(f64::from(c.get(Species::Xenon)), ATOMIC_VOLUME)
    }

    fn atomic_volume(&self) -> f64 {
        ATOMIC_VOLUME
    }

    fn emitted_monomers(&self) -> Vec<Composition> {
        vec![Composition::single(Species::Xenon, 1)]
    }

    fn can_emit(&self, parent: &Composition, monomer: &Composition) -> bool {
        monomer.get(Species::Xenon) == 1 && parent.get(Species::Xenon) >= 2
    }

    fn dissociation_enabled(&self) -> bool {
        self.dissociation
    }
}
