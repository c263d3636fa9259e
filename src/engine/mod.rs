pub mod backtest;
pub mod cache;
pub mod frame;
pub mod returns;

pub use backtest::{BacktestError, BacktestReport, BacktestWarning, Backtester, TickerOutcome};
pub use cache::{CacheKey, SeriesCache};
pub use frame::BacktestFrame;
pub use returns::{PositionReturnEngine, ReturnFrame};
