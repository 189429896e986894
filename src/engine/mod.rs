pub mod evaluator;
pub mod flux;
pub mod generator;
pub mod network;
pub mod overlap;
pub mod rates;
pub mod reactions;
