use anyhow::{Context, Result};

use crate::engine::flux::{compute_fluxes, compute_partials, SparsityPattern};
use crate::engine::network::ReactionNetwork;
use crate::engine::rates::RateConstants;

/// What the time integrator needs from one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Flux,
    FluxAndJacobian,
}

/// The result of a chemistry evaluation at one grid point.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    /// Net reaction rate of change per state slot.
    pub flux: Vec<f64>,
    /// Jacobian values aligned with the evaluator's sparsity pattern.
    /// None unless requested.
    pub jacobian: Option<Vec<f64>>,
    /// Largest production rate constant at this temperature (1/s per unit concentration).
    pub largest_rate: f64,
}

/// A generic interface for per-grid-point chemistry.
/// Implementations must be Thread-Safe (Sync).
pub trait Evaluator: Send + Sync {
    /// Length of the state vector.
    fn dof(&self) -> usize;

    /// Static Jacobian structure, fixed after construction.
    fn sparsity(&self) -> &SparsityPattern;

    /// Computes rates for `temperature`, then flux (and Jacobian) at `concentrations`.
    fn evaluate(
        &self,
        temperature: f64,
        concentrations: &[f64],
        request: Request,
    ) -> Result<EvaluationResult>;

    /// Returns the name of the engine (e.g., "tungsten").
    fn name(&self) -> &str;
}

impl Evaluator for ReactionNetwork {
    fn dof(&self) -> usize {
        ReactionNetwork::dof(self)
    }

    fn sparsity(&self) -> &SparsityPattern {
        ReactionNetwork::sparsity(self)
    }

    fn evaluate(
        &self,
        temperature: f64,
        concentrations: &[f64],
        request: Request,
    ) -> Result<EvaluationResult> {
        let rates = RateConstants::compute(self, temperature)
            .with_context(|| format!("Failed to compute rate constants at {} K", temperature))?;

        let mut flux = vec![0.0; ReactionNetwork::dof(self)];
        compute_fluxes(self, &rates, concentrations, &mut flux).context("Flux evaluation failed")?;

        let jacobian = match request {
            Request::Flux => None,
            Request::FluxAndJacobian => {
                let mut values = vec![0.0; ReactionNetwork::sparsity(self).nnz()];
                compute_partials(self, &rates, concentrations, &mut values)
                    .context("Jacobian evaluation failed")?;
                Some(values)
            }
        };

        Ok(EvaluationResult {
            flux,
            jacobian,
            largest_rate: rates.largest_production(),
        })
    }

    fn name(&self) -> &str {
        self.material().name()
    }
}
