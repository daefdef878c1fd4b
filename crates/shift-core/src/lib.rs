pub mod config;
pub mod share;
pub mod shift;
pub mod summary;
pub mod types;

pub use config::ShiftConfig;
pub use shift::{Clock, FixedClock, ShiftContext, ShiftSchedule, SystemClock};
pub use summary::{SummaryContext, SummaryFormat, SummarySnapshot};
pub use types::*;
