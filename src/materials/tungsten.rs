use crate::core::domain::{Composition, NetworkParams, Species};
use crate::core::error::{NetworkError, NetworkResult};
use crate::core::spatial::{AxisMask, PhaseSpace, Region};
use crate::materials::{
    bcc_helium_radius, bcc_loop_radius, refine_by_schedule, BinSchedule, HeVSpace, Material,
    DEFECT_AXIS,
};

const LATTICE: f64 = 0.317; // nm

// He_n, n = 1..=8
const HELIUM_FORMATION: [f64; 8] = [6.15, 11.44, 16.35, 21.0, 26.1, 30.24, 34.93, 38.80];
// He_n, n = 1..=7; larger helium clusters are immobile
const HELIUM_MIGRATION: [f64; 7] = [0.13, 0.20, 0.25, 0.20, 0.12, 0.30, 0.40];
const HELIUM_DIFFUSION: [f64; 7] = [2.95e10, 3.24e10, 2.26e10, 1.68e10, 5.2e9, 1.2e10, 1.0e10];
// I_n, n = 1..=5
const INTERSTITIAL_MIGRATION: [f64; 5] = [0.01, 0.02, 0.03, 0.04, 0.05];

const VACANCY_MIGRATION: f64 = 1.30;
const VACANCY_DIFFUSION: f64 = 1.8e12;
const INTERSTITIAL_DIFFUSION: f64 = 8.8e10;

// Helium binding to He_(m-1) V_n falls linearly with the He/V ratio,
// Eb_He = HELIUM_VACANCY_BINDING - 2 * HELIUM_PRESSURE * (m - 1) / n, and
// stays positive up to the cap m = 4n + 5.
const HELIUM_VACANCY_BINDING: f64 = 4.6;
const HELIUM_PRESSURE: f64 = 0.25;

/// Helium in tungsten: He_n, V_n, I_n and He_m V_n with `m <= 4n + 5`.
pub struct Tungsten {
    space: HeVSpace,
    schedule: Option<BinSchedule>,
    dissociation: bool,
}

impl Tungsten {
    pub fn new(params: &NetworkParams) -> NetworkResult<Self> {
        if params.max_helium as usize > HELIUM_FORMATION.len() {
            return Err(NetworkError::Config(format!(
                "tungsten tabulates helium clusters up to He_{}, got max_helium = {}",
                HELIUM_FORMATION.len(),
                params.max_helium
            )));
        }
        Ok(Self {
            space: HeVSpace::new(params, 4, 5)?,
            schedule: BinSchedule::from_params(params.grouping.as_ref()),
            dissociation: params.dissociation_enabled,
        })
    }

    fn vacancy_formation(n: f64) -> f64 {
        3.6 * n.powf(2.0 / 3.0)
    }
}

impl Material for Tungsten {
    fn name(&self) -> &str {
        "tungsten"
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
        let he = c.get(Species::Helium) as usize;
        let v = f64::from(c.get(Species::Vacancy));
        let i = f64::from(c.get(Species::Interstitial));
        if v > 0.0 {
            // Sum of the helium binding energies added one atom at a time
            let m = he as f64;
            Self::vacancy_formation(v)
                + m * (HELIUM_FORMATION[0] - HELIUM_VACANCY_BINDING)
                + HELIUM_PRESSURE * m * (m - 1.0) / v
        } else if i > 0.0 {
            10.0 * i.powf(2.0 / 3.0)
        } else if he > 0 {
            HELIUM_FORMATION.get(he - 1).copied().unwrap_or(f64::INFINITY)
        } else {
            0.0
        }
    }

    fn migration_energy(&self, c: &Composition) -> f64 {
        let n = c.total() as usize;
        if c.is_mixed() || n == 0 {
            return f64::INFINITY;
        }
        let table: &[f64] = if c.get(Species::Helium) > 0 {
            &HELIUM_MIGRATION
        } else if c.get(Species::Interstitial) > 0 {
            &INTERSTITIAL_MIGRATION
        } else {
            &[VACANCY_MIGRATION]
        };
        table.get(n - 1).copied().unwrap_or(f64::INFINITY)
    }

    fn diffusion_factor(&self, c: &Composition) -> f64 {
        let n = c.total() as usize;
        if c.is_mixed() || n == 0 {
            return 0.0;
        }
        if c.get(Species::Helium) > 0 {
            HELIUM_DIFFUSION.get(n - 1).copied().unwrap_or(0.0)
        } else if c.get(Species::Interstitial) > 0 {
            if n <= INTERSTITIAL_MIGRATION.len() {
                INTERSTITIAL_DIFFUSION / n as f64
            } else {
                0.0
            }
        } else if n == 1 {
            VACANCY_DIFFUSION
        } else {
            0.0
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
        if parent.total() < 2 {
            return false;
        }
        if monomer.get(Species::Helium) > 0 {
            parent.get(Species::Helium) > 0
        } else if monomer.get(Species::Vacancy) > 0 {
            parent.get(Species::Vacancy) > 0
        } else if monomer.get(Species::Interstitial) > 0 {
            // Trap-mutation reverse: He_m V_n -> I + He_m V_(n+1)
            parent.get(Species::Interstitial) > 0 || parent.is_mixed()
        } else {
            false
        }
    }

    fn dissociation_enabled(&self) -> bool {
        self.dissociation
    }
}
