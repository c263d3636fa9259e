use crate::data::{CsvProvider, MarketDataProvider, TimeoutProvider, YahooProvider};
use crate::strategy::SignalEngine;
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} window must be at least 1")]
    ZeroWindow(&'static str),
    #[error("start date {start} must be before end date {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
    #[error("no tickers given")]
    NoTickers,
    #[error("worker count must be at least 1")]
    ZeroWorkers,
}

//sma window lengths
//fast and slow drive the signal, trend is only drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub trend_window: Option<usize>,
}

impl Default for SmaParams {
    fn default() -> Self {
        SmaParams {
            fast_window: 20,
            slow_window: 50,
            trend_window: Some(200),
        }
    }
}

impl SmaParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_window == 0 {
            return Err(ConfigError::ZeroWindow("fast"));
        }
        if self.slow_window == 0 {
            return Err(ConfigError::ZeroWindow("slow"));
        }
        if self.trend_window == Some(0) {
            return Err(ConfigError::ZeroWindow("trend"));
        }
        Ok(())
    }

    pub fn to_engine(&self) -> SignalEngine {
        SignalEngine::new(self.fast_window, self.slow_window, self.trend_window)
    }
}

//where bars come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Yahoo,
    Csv { path: PathBuf },
}

//complete backtest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //universe
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,

    //strategy
    pub sma: SmaParams,

    //execution
    pub workers: usize,
    pub fetch_timeout_secs: Option<u64>,
    pub provider: ProviderConfig,

    //optional outputs
    pub output_summary_csv: Option<PathBuf>,
    pub output_series_dir: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            tickers: vec!["AAPL".to_string(), "MSFT".to_string(), "TSLA".to_string()],
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: Utc::now().date_naive(),
            sma: SmaParams::default(),
            workers: 4,
            fetch_timeout_secs: Some(60),
            provider: ProviderConfig::Yahoo,
            output_summary_csv: None,
            output_series_dir: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file {:?}", path))?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)
            .context(format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).context(format!("Failed to write config file {:?}", path))?;
        Ok(())
    }

    //upper-cases, trims and drops empty tickers, keeping order and duplicates
    pub fn normalize(&mut self) {
        self.tickers = normalize_tickers(&self.tickers.join(","));
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sma.validate()?;

        if self.start >= self.end {
            return Err(ConfigError::EmptyRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    //builds the configured provider, wrapped with the fetch timeout when one is set
    pub fn build_provider(&self) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
        let provider: Arc<dyn MarketDataProvider> = match &self.provider {
            ProviderConfig::Yahoo => Arc::new(YahooProvider::new(Duration::from_secs(30))?),
            ProviderConfig::Csv { path } => Arc::new(CsvProvider::from_path(path)?),
        };

        Ok(match self.fetch_timeout() {
            Some(timeout) => Arc::new(TimeoutProvider::new(provider, timeout)),
            None => provider,
        })
    }
}

//"aapl, msft,,tsla " -> ["AAPL", "MSFT", "TSLA"]
pub fn normalize_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tickers_are_trimmed_upper_cased_and_filtered() {
        assert_eq!(
            normalize_tickers("aapl, msft,,tsla "),
            vec!["AAPL", "MSFT", "TSLA"]
        );
        assert!(normalize_tickers(" , ").is_empty());
    }

    #[test]
    fn normalize_keeps_duplicates_in_order() {
        let mut config = BacktestConfiguration {
            tickers: vec![" spy".into(), "".into(), "qqq ".into(), "SPY".into()],
            ..Default::default()
        };
        config.normalize();
        assert_eq!(config.tickers, vec!["SPY", "QQQ", "SPY"]);
    }

    #[test]
    fn default_windows_are_20_50_200() {
        let params = SmaParams::default();
        assert_eq!(params.fast_window, 20);
        assert_eq!(params.slow_window, 50);
        assert_eq!(params.trend_window, Some(200));
        assert_eq!(params.to_engine().longest_window(), 200);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = BacktestConfiguration {
            start: date(2020, 1, 1),
            end: date(2024, 1, 1),
            ..Default::default()
        };
        assert_eq!(base.validate(), Ok(()));

        let mut c = base.clone();
        c.sma.slow_window = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroWindow("slow")));

        let mut c = base.clone();
        c.end = c.start;
        assert!(matches!(c.validate(), Err(ConfigError::EmptyRange { .. })));

        let mut c = base.clone();
        c.tickers.clear();
        assert_eq!(c.validate(), Err(ConfigError::NoTickers));

        let mut c = base;
        c.workers = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = BacktestConfiguration {
            tickers: vec!["SPY".into()],
            start: date(2021, 1, 1),
            end: date(2023, 1, 1),
            provider: ProviderConfig::Csv {
                path: PathBuf::from("bars.csv"),
            },
            ..Default::default()
        };
        config.to_json_file(&path).unwrap();

        let loaded = BacktestConfiguration::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: BacktestConfiguration =
            serde_json::from_str(r#"{"tickers":["nvda"],"start":"2022-01-03"}"#).unwrap();

        assert_eq!(config.tickers, vec!["nvda"]);
        assert_eq!(config.start, date(2022, 1, 3));
        assert_eq!(config.sma, SmaParams::default());
        assert_eq!(config.provider, ProviderConfig::Yahoo);
    }

    #[test]
    fn missing_csv_provider_fails_to_build() {
        let config = BacktestConfiguration {
            provider: ProviderConfig::Csv {
                path: PathBuf::from("/nonexistent/bars.csv"),
            },
            ..Default::default()
        };
        assert!(config.build_provider().is_err());
    }
}
