use crate::data::bar::PriceBar;
use crate::data::provider::{DataError, MarketDataProvider};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRecord {
    date: String,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

//loads bars from a csv file with columns date,symbol,open,high,low,close,volume
//symbols are upper-cased, bars are sorted by date within each symbol
//rows with inconsistent ohlc values or negative volume are rejected
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, Vec<PriceBar>>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut by_symbol: IndexMap<String, Vec<PriceBar>> = IndexMap::new();

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.context(format!("Failed to parse CSV record at line {}", index + 2))?;

        let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").context(format!(
            "Failed to parse date '{}' at line {}",
            record.date,
            index + 2
        ))?;

        let bar = PriceBar::new(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        )
        .context(format!("Invalid bar at line {}", index + 2))?;

        by_symbol
            .entry(record.symbol.to_uppercase())
            .or_default()
            .push(bar);
    }

    //sort by date to ensure chronological order
    for bars in by_symbol.values_mut() {
        bars.sort_by(|a, b| a.date.cmp(&b.date));
    }

    Ok(by_symbol)
}

//filters bars to the half-open date range [start, end)
pub fn filter_by_range(bars: &[PriceBar], start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    bars.iter()
        .filter(|bar| bar.date >= start && bar.date < end)
        .cloned()
        .collect()
}

//provider backed by a local csv file, loaded once at construction
pub struct CsvProvider {
    path: PathBuf,
    bars: IndexMap<String, Vec<PriceBar>>,
}

impl CsvProvider {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bars = load_csv(&path)?;
        Ok(CsvProvider { path, bars })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    //symbols present in the file, in first-seen order
    pub fn symbols(&self) -> Vec<&str> {
        self.bars.keys().map(String::as_str).collect()
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let bars = self
            .bars
            .get(&ticker.to_uppercase())
            .map(|bars| filter_by_range(bars, start, end))
            .unwrap_or_default();

        if bars.is_empty() {
            return Err(DataError::NoData {
                ticker: ticker.to_string(),
            });
        }

        Ok(bars)
    }
}
