use crate::core::chemistry::{diffusion_coefficient, dissociation_rate, production_rate};
use crate::core::error::{NetworkError, NetworkResult};
use crate::engine::network::ReactionNetwork;
use crate::engine::reactions::Reaction;

/// Rate constant of every reaction at one temperature.
///
/// Always computed from scratch: a set belongs to exactly one temperature
/// and is never patched in place by the network.
#[derive(Debug, Clone, PartialEq)]
pub struct RateConstants {
    temperature: f64,
    rates: Vec<f64>,
    diffusion: Vec<f64>,
    largest_production: f64,
}

impl RateConstants {
    pub fn compute(network: &ReactionNetwork, temperature: f64) -> NetworkResult<Self> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(NetworkError::InvalidTemperature(temperature));
        }
        let material = network.material();

        let diffusion: Vec<f64> = network
            .clusters()
            .iter()
            .map(|c| {
                diffusion_coefficient(
                    c.properties.diffusion_factor,
                    c.properties.migration_energy,
                    temperature,
                )
            })
            .collect();

        let core = material.core_radius();
        let omega = material.atomic_volume();
        let dissociation = material.dissociation_enabled();

        let mut rates = vec![0.0; network.reactions().len()];
        let mut largest_production = 0.0f64;

        // Productions first; dissociations read their reverse rate
        for (i, reaction) in network.reactions().iter().enumerate() {
            if let Reaction::Production { first, second } = *reaction {
                let (a, b) = (network.cluster(first), network.cluster(second));
                let k = production_rate(
                    a.properties.reaction_radius,
                    b.properties.reaction_radius,
                    core,
                    diffusion[first],
                    diffusion[second],
                );
                largest_production = largest_production.max(k);
                rates[i] = k;
            }
        }
        if dissociation {
            for (i, reaction) in network.reactions().iter().enumerate() {
                if let Reaction::Dissociation {
                    reverse,
                    binding_energy,
                    ..
                } = *reaction
                {
                    rates[i] =
                        dissociation_rate(rates[reverse], binding_energy, omega, temperature);
                }
            }
        }

        Ok(Self {
            temperature,
            rates,
            diffusion,
            largest_production,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[inline]
    pub fn rate(&self, reaction: usize) -> f64 {
        self.rates[reaction]
    }

    pub fn values(&self) -> &[f64] {
        &self.rates
    }

    /// Direct access for diagnostics that switch individual reactions off.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.rates
    }

    /// Diffusion coefficient of cluster `id` (nm^2/s).
    #[inline]
    pub fn diffusion(&self, id: usize) -> f64 {
        self.diffusion[id]
    }

    /// Fastest production rate; bounds the stiffness of the system.
    pub fn largest_production(&self) -> f64 {
        self.largest_production
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
