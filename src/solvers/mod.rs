/// Summary of one sweep over the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStats {
    pub points: usize,
    pub evaluated: usize, // Points whose flux (and Jacobian) came back
    pub failed: usize,    // Points rejected by the evaluator (bad temperature, wrong length)

    /// Largest production rate over all evaluated points.
    /// Lets the integrator bound its first step.
    pub largest_rate: f64,
    pub elapsed_secs: f64,
}

impl Default for GridStats {
    fn default() -> Self {
        Self {
            points: 0,
            evaluated: 0,
            failed: 0,
            largest_rate: 0.0,
            elapsed_secs: 0.0,
        }
    }
}

pub mod grid;
