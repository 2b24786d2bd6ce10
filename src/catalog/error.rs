use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TLE source not found: {0}")]
    SourceNotFound(String),
    #[error("Failed to read TLE source: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Satellite {0} is not in the catalog")]
    UnknownSatellite(String),
    #[error("Invalid elements for {satellite}: {message}")]
    InvalidElements { satellite: String, message: String },
}
