//! Physical constants and the rate laws shared by every material.

/// Boltzmann constant (eV/K).
pub const K_BOLTZMANN: f64 = 8.617333262e-5;

pub const PI: f64 = std::f64::consts::PI;

/// Thermal energy `kB * T` (eV).
#[inline]
pub fn thermal_energy(temperature: f64) -> f64 {
    K_BOLTZMANN * temperature
}

/// Arrhenius diffusion coefficient `D = D0 exp(-Em / kB T)` (nm^2/s).
///
/// A zero prefactor or an infinite migration energy means the cluster is
/// immobile and yields exactly 0.
#[inline]
pub fn diffusion_coefficient(
    diffusion_factor: f64,
    migration_energy: f64,
    temperature: f64,
) -> f64 {
    if diffusion_factor == 0.0 || !migration_energy.is_finite() {
        return 0.0;
    }
    diffusion_factor * (-migration_energy / thermal_energy(temperature)).exp()
}

/// Diffusion-limited encounter rate `k+ = 4 pi (rA + rB + rCore)(DA + DB)`.
#[inline]
pub fn production_rate(
    radius_a: f64,
    radius_b: f64,
    core_radius: f64,
    diffusion_a: f64,
    diffusion_b: f64,
) -> f64 {
    4.0 * PI * (radius_a + radius_b + core_radius) * (diffusion_a + diffusion_b)
}

/// Detailed balance: `k- = (1 / Omega) k+ exp(-Eb / kB T)`.
#[inline]
pub fn dissociation_rate(
    reverse_rate: f64,
    binding_energy: f64,
    atomic_volume: f64,
    temperature: f64,
) -> f64 {
    let boltzmann = (-binding_energy / thermal_energy(temperature)).exp();
    reverse_rate * boltzmann / atomic_volume
}

/// Inverse of [`dissociation_rate`]: recovers `k+` from `k-`.
#[inline]
pub fn production_from_dissociation(
    dissociation: f64,
    binding_energy: f64,
    atomic_volume: f64,
    temperature: f64,
) -> f64 {
    dissociation * atomic_volume * (binding_energy / thermal_energy(temperature)).exp()
}

/// Radius of a sphere holding `n` units of volume `unit_volume`.
#[inline]
pub fn equivalent_sphere_radius(n: f64, unit_volume: f64) -> f64 {
    (3.0 * n * unit_volume / (4.0 * PI)).cbrt()
}
