pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;
