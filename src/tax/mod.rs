// Tax module - Croatian capital income tax (engine, JOPPD period codes)

pub mod engine;
pub mod period;

pub use engine::{compute_breakdown, RateSchedule, TaxBreakdown};
pub use period::derive_period_code;
