pub mod aggregation;
pub mod extractor;
pub mod pool;
pub mod summary;

pub use aggregation::AggregationEngine;
pub use extractor::{Extraction, ExtractionGap, SeriesExtractor};
pub use pool::ProcessingPool;
pub use summary::{PairSummary, RunSummary, UnitFailure};
