pub mod fetch_unit;
pub mod location;
pub mod series;
pub mod variable;

pub use fetch_unit::{DownloadOutcome, DownloadResult, FetchUnit, GridBounds};
pub use location::Location;
pub use series::{DailyAggregate, ScalarSeries, WeeklyAggregate};
pub use variable::{Aggregator, ConversionRule, VariableSpec};
