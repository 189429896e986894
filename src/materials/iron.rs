use crate::core::domain::{Composition, NetworkParams, Species};
use crate::core::error::NetworkResult;
use crate::core::spatial::{AxisMask, PhaseSpace, Region};
use crate::materials::{
    bcc_helium_radius, bcc_loop_radius, refine_by_schedule, BinSchedule, HeVSpace, Material,
    DEFECT_AXIS,
};

const LATTICE: f64 = 0.287; // nm

const HELIUM_FORMATION: f64 = 4.08;
const VACANCY_FORMATION: f64 = 1.9;
const INTERSTITIAL_FORMATION: f64 = 3.52;
// Eb_He(He_m V_n) = HELIUM_VACANCY_BINDING - 2 * HELIUM_PRESSURE * (m - 1) / n,
// positive up to the cap m = 4n
const HELIUM_VACANCY_BINDING: f64 = 2.3;
const HELIUM_PRESSURE: f64 = 0.25;

const HELIUM_MIGRATION: f64 = 0.06; // He_1..He_3
const VACANCY_MIGRATION: f64 = 0.67;
const INTERSTITIAL_MIGRATION: f64 = 0.34;

const HELIUM_DIFFUSION: f64 = 1.0e11;
const VACANCY_DIFFUSION: f64 = 1.0e12;
const INTERSTITIAL_DIFFUSION: f64 = 1.0e11;

/// Interstitial bias of the dislocation sink.
const SINK_BIAS: f64 = 1.05;
/// Sink strength used when the run configures none.
const DEFAULT_SINK_STRENGTH: f64 = 8.0e-4;

/// Helium in alpha iron, with dislocation sinks for small vacancy and
/// interstitial clusters.
pub struct Iron {
    space: HeVSpace,
    schedule: Option<BinSchedule>,
    dissociation: bool,
    sink: f64,
}

impl Iron {
    pub fn new(params: &NetworkParams) -> NetworkResult<Self> {
        let sink = if params.sink_strength > 0.0 {
            params.sink_strength
        } else {
            DEFAULT_SINK_STRENGTH
        };
        Ok(Self {
            space: HeVSpace::new(params, 4, 0)?,
            schedule: BinSchedule::from_params(params.grouping.as_ref()),
            dissociation: params.dissociation_enabled,
            sink,
        })
    }
}

impl Material for Iron {
    fn name(&self) -> &str {
        "iron"
    }

    fn phase_space(&self) -> &PhaseSpace {
        self.space.phase_space()
    }

    fn bounds(&self) -> Region {
        self.space.bounds()
    }

    fn intersect(&self, region: &Region) -> bool {
        self.space.intersect(region)
    }

    fn select(&self, region: &Region) -> bool {
        self.space.select(region)
    }

    fn refine(&self, region: &Region) -> AxisMask {
        refine_by_schedule(
            region,
            2,
            DEFECT_AXIS,
            self.schedule.as_ref(),
            self.space.select(region),
        )
    }

    fn formation_energy(&self, c: &Composition) -> f64 {
        let he = f64::from(c.get(Species::Helium));
        let v = f64::from(c.get(Species::Vacancy));
        let i = f64::from(c.get(Species::Interstitial));
        let scale = |n: f64| n.powf(2.0 / 3.0);
        if v > 0.0 {
            VACANCY_FORMATION * scale(v)
                + he * (HELIUM_FORMATION - HELIUM_VACANCY_BINDING)
                + HELIUM_PRESSURE * he * (he - 1.0) / v
        } else if i > 0.0 {
            INTERSTITIAL_FORMATION * scale(i)
        } else {
            HELIUM_FORMATION * scale(he)
        }
    }

    fn migration_energy(&self, c: &Composition) -> f64 {
        if c.is_mixed() {
            return f64::INFINITY;
        }
        match (c.get(Species::Helium), c.get(Species::Vacancy), c.get(Species::Interstitial)) {
            (1..=3, 0, 0) => HELIUM_MIGRATION,
            (0, 1, 0) => VACANCY_MIGRATION,
            (0, 0, 1) => INTERSTITIAL_MIGRATION,
            _ => f64::INFINITY,
        }
    }

    fn diffusion_factor(&self, c: &Composition) -> f64 {
        if c.is_mixed() {
            return 0.0;
        }
        match (c.get(Species::Helium), c.get(Species::Vacancy), c.get(Species::Interstitial)) {
            (1..=3, 0, 0) => HELIUM_DIFFUSION,
            (0, 1, 0) => VACANCY_DIFFUSION,
            (0, 0, 1) => INTERSTITIAL_DIFFUSION,
            _ => 0.0,
        }
    }

    fn reaction_radius(&self, c: &Composition) -> f64 {
        let v = c.get(Species::Vacancy);
        let i = c.get(Species::Interstitial);
        if v > 0 {
            bcc_loop_radius(f64::from(v), LATTICE)
        } else if i > 0 {
            bcc_loop_radius(f64::from(i), LATTICE)
        } else {
            bcc_helium_radius(f64::from(c.get(Species::Helium)), LATTICE)
        }
    }

    fn core_radius(&self) -> f64 {
        0.5 * LATTICE
    }

    fn atomic_volume(&self) -> f64 {
        0.5 * LATTICE.powi(3)
    }

    fn emitted_monomers(&self) -> Vec<Composition> {
        vec![
            Composition::single(Species::Helium, 1),
            Composition::single(Species::Vacancy, 1),
            Composition::single(Species::Interstitial, 1),
        ]
    }

    fn can_emit(&self, parent: &Composition, monomer: &Composition) -> bool {
        parent.total() >= 2 && monomer.iter().all(|(species, _)| parent.get(species) > 0)
    }

    /// Small vacancy clusters and single interstitials are absorbed at
    /// dislocations, interstitials with a bias.
    fn sink_strength(&self, c: &Composition) -> f64 {
        if c.is_mixed() {
            return 0.0;
        }
        match (c.get(Species::Helium), c.get(Species::Vacancy), c.get(Species::Interstitial)) {
            (0, 1..=4, 0) => self.sink,
            (0, 0, 1) => SINK_BIAS * self.sink,
            _ => 0.0,
        }
    }

    fn dissociation_enabled(&self) -> bool {
        self.dissociation
    }
}
