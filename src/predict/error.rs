use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid observation window: {0}")]
    InvalidWindow(String),
    #[error("Invalid TLE for {satellite}: {message}")]
    InvalidTle { satellite: String, message: String },
    #[error("Propagation error: {0}")]
    Propagation(String),
}
