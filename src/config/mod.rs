pub mod backtest_config;

pub use backtest_config::{
    normalize_tickers, BacktestConfiguration, ConfigError, ProviderConfig, SmaParams,
};
