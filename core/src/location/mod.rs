pub mod arbiter;
pub mod center;

pub use arbiter::{LocationArbiter, STALENESS_WINDOW_MS};
pub use center::LocationCenter;
