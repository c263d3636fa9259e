pub mod performance;
pub mod summary;
pub mod timeseries;

pub use performance::{growth_multiple, Performance, PerformanceAnalyzer, TRADING_DAYS_PER_YEAR};
pub use summary::{PerformanceSummaryRow, SummaryTable, SUMMARY_HEADER};
pub use timeseries::{calculate_growth_curves, growth_curve, GrowthPoint};
