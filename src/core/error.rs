use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate cluster {composition} (region {region}) not added")]
    DuplicateCluster { composition: String, region: String },

    #[error("Invalid composition: {0}")]
    InvalidComposition(String),

    #[error("Material {0} admits no clusters")]
    EmptyNetwork(String),

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid temperature: {0} K")]
    InvalidTemperature(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
