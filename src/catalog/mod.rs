mod error;
mod store;

pub use error::CatalogError;
pub use store::{SourceShape, TleCatalog, TleRecord, TleSource};
