pub mod catalog_reader;
pub mod grid_reader;
pub mod location_reader;

pub use catalog_reader::CatalogReader;
pub use grid_reader::{GridReader, GridSubset};
pub use location_reader::LocationReader;
