#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use smabench::data::{DataError, MarketDataProvider, PriceBar, PriceSeries};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

//deterministic provider: fixed closes per ticker, scripted failures, per-ticker call counts
#[derive(Default)]
pub struct StubProvider {
    closes: HashMap<String, Vec<f64>>,
    failures: HashMap<String, DataError>,
    delay: std::time::Duration,
    calls: AtomicUsize,
    calls_by_ticker: Mutex<HashMap<String, usize>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closes(mut self, ticker: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(ticker.to_string(), closes);
        self
    }

    pub fn with_failure(mut self, ticker: &str, error: DataError) -> Self {
        self.failures.insert(ticker.to_string(), error);
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, ticker: &str) -> usize {
        self.calls_by_ticker
            .lock()
            .unwrap()
            .get(ticker)
            .copied()
            .unwrap_or(0)
    }
}

impl MarketDataProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_by_ticker
            .lock()
            .unwrap()
            .entry(ticker.to_string())
            .or_default() += 1;

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if let Some(err) = self.failures.get(ticker) {
            return Err(err.clone());
        }

        match self.closes.get(ticker) {
            Some(closes) if !closes.is_empty() => Ok(bars_from(start, closes)),
            _ => Err(DataError::NoData {
                ticker: ticker.to_string(),
            }),
        }
    }
}

pub fn bars_from(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::from_close(start + Duration::days(i as i64), close))
        .collect()
}

pub fn series_from(closes: &[f64]) -> PriceSeries {
    PriceSeries::new("TEST", bars_from(start(), closes)).unwrap()
}

pub fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

pub fn end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

pub fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

//deterministic random walk using a simple LCG
pub fn random_walk(n: usize, seed: u64) -> Vec<f64> {
    let mut price = 100.0;
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let change = ((state >> 33) % 200) as f64 / 100.0 - 1.0;
            price = (price + change).max(1.0);
            price
        })
        .collect()
}
