//! Cluster reaction network engine for point-defect cluster dynamics.
//!
//! Builds the set of tracked defect clusters for a material, enumerates the
//! reactions between them and evaluates the per-grid-point reaction flux and
//! its analytic Jacobian for an external time integrator.

pub mod analysis;
pub mod core;
pub mod engine;
pub mod io;
pub mod materials;
pub mod solvers;

pub use crate::core::domain::{Cluster, ClusterKind, Composition, NetworkParams, Species};
pub use crate::core::error::{NetworkError, NetworkResult};
pub use crate::engine::network::ReactionNetwork;
pub use crate::engine::rates::RateConstants;
