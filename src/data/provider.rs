use crate::data::bar::PriceBar;
use chrono::NaiveDate;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

//errors raised while fetching market data for one ticker
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("no data returned for {ticker}")]
    NoData { ticker: String },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("fetch for {ticker} timed out after {timeout:?}")]
    Timeout { ticker: String, timeout: Duration },
}

//source of daily bars
//implementations return bars in ascending date order for the half-open range [start, end)
pub trait MarketDataProvider: Send + Sync {
    //human-readable provider name
    fn name(&self) -> &str;

    //fetch daily bars for a ticker
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<PriceBar>, DataError>;
}

//wraps a provider and gives up on any fetch that runs longer than the timeout
//the abandoned fetch keeps running on its own thread and its result is dropped
pub struct TimeoutProvider {
    inner: Arc<dyn MarketDataProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn MarketDataProvider>, timeout: Duration) -> Self {
        TimeoutProvider { inner, timeout }
    }
}

impl MarketDataProvider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned = ticker.to_string();

        thread::Builder::new()
            .name(format!("fetch-{ticker}"))
            .spawn(move || {
                //receiver may already be gone after a timeout
                let _ = tx.send(inner.fetch(&owned, start, end));
            })
            .map_err(|e| DataError::Provider(format!("failed to spawn fetch thread: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(DataError::Timeout {
                ticker: ticker.to_string(),
                timeout: self.timeout,
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(DataError::Provider(format!(
                "fetch thread for {ticker} exited without a result"
            ))),
        }
    }
}
