//a Rust-based multi-asset SMA crossover backtesting tool

pub mod config;
pub mod data;
pub mod engine;
pub mod metrics;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        normalize_tickers, BacktestConfiguration, ConfigError, ProviderConfig, SmaParams,
    };
    pub use crate::data::{
        load_csv, CsvProvider, DataError, MarketDataProvider, PriceBar, PriceSeries,
        TimeoutProvider, YahooProvider,
    };
    pub use crate::engine::{
        BacktestError, BacktestFrame, BacktestReport, BacktestWarning, Backtester,
        PositionReturnEngine, ReturnFrame, SeriesCache, TickerOutcome,
    };
    pub use crate::metrics::{
        growth_curve, growth_multiple, GrowthPoint, Performance, PerformanceAnalyzer,
        PerformanceSummaryRow, SummaryTable,
    };
    pub use crate::strategy::{sma, CrossoverMarkers, Signal, SignalEngine, SignalFrame};
}
