use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rayon::prelude::*;

use crate::engine::evaluator::{Evaluator, Request};
use crate::solvers::GridStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStatus {
    Pending,
    Evaluated,
    Failed,
}

/// State and outputs of one spatial grid point.
#[derive(Debug, Clone)]
pub struct GridPoint {
    pub temperature: f64,
    pub concentrations: Vec<f64>,
    pub flux: Vec<f64>,
    pub jacobian: Option<Vec<f64>>,
    pub largest_rate: f64,
    pub status: PointStatus,
}

impl GridPoint {
    pub fn new(temperature: f64, concentrations: Vec<f64>) -> Self {
        Self {
            temperature,
            concentrations,
            flux: Vec::new(),
            jacobian: None,
            largest_rate: 0.0,
            status: PointStatus::Pending,
        }
    }
}

/// Evaluates the chemistry of every grid point in parallel.
///
/// Points share the evaluator read-only; each computes its own rate
/// constants for its own temperature and writes only its own outputs.
pub struct GridSolver {
    evaluator: Arc<dyn Evaluator>,
    request: Request,
}

impl GridSolver {
    pub fn new(evaluator: Arc<dyn Evaluator>, request: Request) -> Self {
        Self { evaluator, request }
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    /// Fills `flux` (and `jacobian`) of every point. Failures are marked on
    /// the point and counted, never propagated.
    pub fn evaluate(&self, points: &mut [GridPoint]) -> GridStats {
        let start = Instant::now();
        let eval_ref = &self.evaluator;
        let request = self.request;

        points.par_iter_mut().for_each(|point| {
            match eval_ref.evaluate(point.temperature, &point.concentrations, request) {
                Ok(res) => {
                    point.flux = res.flux;
                    point.jacobian = res.jacobian;
                    point.largest_rate = res.largest_rate;
                    point.status = PointStatus::Evaluated;
                }
                Err(e) => {
                    warn!("Grid point at {} K failed: {:#}", point.temperature, e);
                    point.flux.clear();
                    point.jacobian = None;
                    point.status = PointStatus::Failed;
                }
            }
        });

        let evaluated = points
            .iter()
            .filter(|p| p.status == PointStatus::Evaluated)
            .count();
        let stats = GridStats {
            points: points.len(),
            evaluated,
            failed: points.len() - evaluated,
            largest_rate: points
                .iter()
                .filter(|p| p.status == PointStatus::Evaluated)
                .map(|p| p.largest_rate)
                .fold(0.0, f64::max),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        debug!(
            "{}: evaluated {}/{} grid points in {:.3}s",
            eval_ref.name(),
            stats.evaluated,
            stats.points,
            stats.elapsed_secs
        );
        stats
    }
}
