use crate::data::provider::DataError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
}

//a single daily ohlcv bar for one instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    //creates a new PriceBar with validation
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        //validate high >= low
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        //validate close within [low, high]
        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        //validate open within [low, high]
        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        //validate non-negative volume
        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(Self::new_unchecked(date, open, high, low, close, volume))
    }

    //creates a PriceBar without validation
    pub fn new_unchecked(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    //bar with every price set to close, mostly for synthetic data
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self::new_unchecked(date, close, close, close, close, 0.0)
    }
}

//ordered daily history for one ticker
//dates are strictly increasing, the bar list is never empty
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, DataError> {
        let ticker = ticker.into();

        if bars.is_empty() {
            return Err(DataError::NoData { ticker });
        }

        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(DataError::Provider(format!(
                "{}: dates not strictly increasing at {} (after {})",
                ticker, pair[1].date, pair[0].date
            )));
        }

        Ok(PriceSeries { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    //always false for a constructed series, kept for clippy
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn bar_validation_rejects_inverted_range() {
        let err = PriceBar::new(day(2), 10.0, 9.0, 11.0, 10.0, 100.0).unwrap_err();
        assert!(matches!(err, BarError::InvalidHighLow { .. }));
    }

    #[test]
    fn bar_validation_rejects_close_outside_range() {
        let err = PriceBar::new(day(2), 10.0, 11.0, 9.0, 12.0, 100.0).unwrap_err();
        assert!(matches!(err, BarError::InvalidClose { .. }));
    }

    #[test]
    fn bar_validation_rejects_negative_volume() {
        let err = PriceBar::new(day(2), 10.0, 11.0, 9.0, 10.5, -1.0).unwrap_err();
        assert!(matches!(err, BarError::NegativeVolume(_)));
    }

    #[test]
    fn series_rejects_empty() {
        let err = PriceSeries::new("AAPL", vec![]).unwrap_err();
        assert!(matches!(err, DataError::NoData { ref ticker } if ticker == "AAPL"));
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let bars = vec![
            PriceBar::from_close(day(2), 10.0),
            PriceBar::from_close(day(2), 11.0),
        ];
        let err = PriceSeries::new("AAPL", bars).unwrap_err();
        assert!(matches!(err, DataError::Provider(_)));
    }

    #[test]
    fn series_rejects_descending_dates() {
        let bars = vec![
            PriceBar::from_close(day(3), 10.0),
            PriceBar::from_close(day(2), 11.0),
        ];
        assert!(PriceSeries::new("AAPL", bars).is_err());
    }

    #[test]
    fn series_accessors() {
        let bars = vec![
            PriceBar::from_close(day(2), 10.0),
            PriceBar::from_close(day(3), 11.0),
            PriceBar::from_close(day(4), 12.0),
        ];
        let series = PriceSeries::new("MSFT", bars).unwrap();
        assert_eq!(series.ticker(), "MSFT");
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert_eq!(series.first_date(), day(2));
        assert_eq!(series.last_date(), day(4));
    }
}
