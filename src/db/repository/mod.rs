pub mod dose_log;
pub mod medicine;

pub use dose_log::*;
pub use medicine::*;

/// Timestamp format used for TEXT datetime columns.
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S%.f";
