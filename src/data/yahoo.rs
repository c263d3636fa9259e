use crate::data::bar::PriceBar;
use crate::data::provider::{DataError, MarketDataProvider};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

//v8 chart api response, only the fields we read
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    //exchange offset from utc in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

//yahoo sends an empty object when the range holds no sessions
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

//daily bars from yahoo finance over blocking http, with exponential backoff
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(request_timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(YahooProvider {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    //period2 is exclusive, so end at midnight keeps the range half-open
    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        format!("{CHART_URL}/{ticker}?period1={start_ts}&period2={end_ts}&interval=1d")
    }

    fn parse_response(
        ticker: &str,
        resp: ChartResponse,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let no_data = || DataError::NoData {
            ticker: ticker.to_string(),
        };

        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => return Err(no_data()),
            (None, Some(err)) => {
                return Err(DataError::Provider(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => return Err(no_data()),
        };

        let data = result.into_iter().next().ok_or_else(no_data)?;
        let gmtoffset = data.meta.map(|m| m.gmtoffset).unwrap_or(0);
        //yahoo omits timestamps entirely when the range holds no sessions
        let timestamps = data.timestamp.ok_or_else(no_data)?;
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::Provider(format!("{ticker}: response has no quote data")))?;

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            //session dates are exchange-local
            let date = DateTime::from_timestamp(ts + gmtoffset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| DataError::Provider(format!("{ticker}: invalid timestamp {ts}")))?;

            if date < start || date >= end {
                continue;
            }

            let close = quote.close.get(i).copied().flatten();
            //skip sessions with no print at all (holidays, halts)
            let Some(close) = close else {
                continue;
            };

            bars.push(PriceBar::new_unchecked(
                date,
                quote.open.get(i).copied().flatten().unwrap_or(f64::NAN),
                quote.high.get(i).copied().flatten().unwrap_or(f64::NAN),
                quote.low.get(i).copied().flatten().unwrap_or(f64::NAN),
                close,
                quote.volume.get(i).copied().flatten().unwrap_or(0.0),
            ));
        }

        if bars.is_empty() {
            return Err(no_data());
        }

        Ok(bars)
    }

    fn fetch_with_retry(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        let url = Self::chart_url(ticker, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(ticker, attempt, ?delay, "retrying yahoo fetch");
                std::thread::sleep(delay);
            }

            debug!(ticker, %url, "requesting chart");

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::Provider(format!("{ticker}: {e}")));
                    continue;
                }
                Err(e) => return Err(DataError::Provider(format!("{ticker}: {e}"))),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::NoData {
                    ticker: ticker.to_string(),
                });
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(DataError::Provider(format!("{ticker}: HTTP {status}")));
                continue;
            }

            if !status.is_success() {
                return Err(DataError::Provider(format!("{ticker}: HTTP {status}")));
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::Provider(format!("{ticker}: failed to parse response: {e}"))
            })?;

            return Self::parse_response(ticker, chart, start, end);
        }

        Err(last_error
            .unwrap_or_else(|| DataError::Provider(format!("{ticker}: max retries exceeded"))))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        self.fetch_with_retry(ticker, start, end)
    }
}
