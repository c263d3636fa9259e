use crate::data::DataError;
use crate::engine::cache::SeriesCache;
use crate::engine::frame::BacktestFrame;
use crate::metrics::{PerformanceAnalyzer, PerformanceSummaryRow, SummaryTable};
use crate::strategy::SignalEngine;
use chrono::NaiveDate;
use indexmap::IndexMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

//reasons a single ticker drops out of the batch
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("window lengths must be at least 1 (got {0})")]
    InvalidWindow(usize),

    #[error("batch cancelled before {0} started")]
    Cancelled(String),

    #[error("pipeline panicked: {0}")]
    Panicked(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

//non-fatal conditions collected over a batch, each naming its ticker
#[derive(Debug, Clone, PartialEq)]
pub enum BacktestWarning {
    //ticker omitted from the summary
    Failed { ticker: String, message: String },
    //history shorter than the longest window; row still produced
    InsufficientHistory {
        ticker: String,
        bars: usize,
        required: usize,
    },
    //sharpe ratio is NaN or infinite; row still produced
    DegenerateStatistics { ticker: String, sharpe: f64 },
    //never started because the batch was cancelled
    Cancelled { ticker: String },
}

impl BacktestWarning {
    pub fn ticker(&self) -> &str {
        match self {
            BacktestWarning::Failed { ticker, .. }
            | BacktestWarning::InsufficientHistory { ticker, .. }
            | BacktestWarning::DegenerateStatistics { ticker, .. }
            | BacktestWarning::Cancelled { ticker } => ticker,
        }
    }

    //true when the ticker is missing from the summary
    pub fn is_omission(&self) -> bool {
        matches!(
            self,
            BacktestWarning::Failed { .. } | BacktestWarning::Cancelled { .. }
        )
    }
}

impl fmt::Display for BacktestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestWarning::Failed { ticker, message } => {
                write!(f, "could not process {ticker}: {message}")
            }
            BacktestWarning::InsufficientHistory {
                ticker,
                bars,
                required,
            } => write!(
                f,
                "{ticker}: only {bars} bars for a {required}-bar window, leading values undefined"
            ),
            BacktestWarning::DegenerateStatistics { ticker, sharpe } => {
                write!(f, "{ticker}: sharpe ratio is undefined ({sharpe})")
            }
            BacktestWarning::Cancelled { ticker } => write!(f, "{ticker}: skipped, batch cancelled"),
        }
    }
}

//everything one ticker contributes to the report
#[derive(Debug, Clone)]
pub struct TickerOutcome {
    pub row: PerformanceSummaryRow,
    pub frame: Arc<BacktestFrame>,
    pub warnings: Vec<BacktestWarning>,
}

//result of a batch run
#[derive(Debug, Clone, Default)]
pub struct BacktestReport {
    pub summary: SummaryTable,
    pub series: IndexMap<String, Arc<BacktestFrame>>,
    pub warnings: Vec<BacktestWarning>,
}

impl BacktestReport {
    pub fn omitted(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter(|w| w.is_omission())
            .map(BacktestWarning::ticker)
            .collect()
    }
}

//drives load -> signal -> returns -> performance for a list of tickers on a bounded pool
pub struct Backtester {
    cache: Arc<SeriesCache>,
    engine: SignalEngine,
    analyzer: PerformanceAnalyzer,
    pool: ThreadPool,
}

impl Backtester {
    pub fn new(
        cache: Arc<SeriesCache>,
        engine: SignalEngine,
        workers: usize,
    ) -> Result<Self, BacktestError> {
        for window in [
            Some(engine.fast_window()),
            Some(engine.slow_window()),
            engine.trend_window(),
        ]
        .into_iter()
        .flatten()
        {
            if window == 0 {
                return Err(BacktestError::InvalidWindow(window));
            }
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("backtest-{i}"))
            .build()?;

        Ok(Backtester {
            cache,
            engine,
            analyzer: PerformanceAnalyzer::default(),
            pool,
        })
    }

    pub fn with_analyzer(mut self, analyzer: PerformanceAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn run(&self, tickers: &[String], start: NaiveDate, end: NaiveDate) -> BacktestReport {
        self.run_with_cancel(tickers, start, end, None)
    }

    //once `cancel` is set no further ticker starts; tickers already running finish
    pub fn run_with_cancel(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
        cancel: Option<&AtomicBool>,
    ) -> BacktestReport {
        info!(
            tickers = tickers.len(),
            %start,
            %end,
            provider = self.cache.provider_name(),
            "starting backtest batch"
        );
        let started = Instant::now();

        //collect keeps input order regardless of completion order
        let results: Vec<(&String, Result<TickerOutcome, BacktestError>)> =
            self.pool.install(|| {
                tickers
                    .par_iter()
                    .map(|ticker| {
                        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                            return (ticker, Err(BacktestError::Cancelled(ticker.clone())));
                        }
                        (ticker, self.run_ticker_isolated(ticker, start, end))
                    })
                    .collect()
            });

        let mut report = BacktestReport::default();

        for (ticker, result) in results {
            match result {
                Ok(outcome) => {
                    for warning in &outcome.warnings {
                        warn!("{warning}");
                    }
                    report.warnings.extend(outcome.warnings);
                    report.summary.push(outcome.row);
                    report.series.insert(ticker.clone(), outcome.frame);
                }
                Err(BacktestError::Cancelled(_)) => {
                    let warning = BacktestWarning::Cancelled {
                        ticker: ticker.clone(),
                    };
                    warn!("{warning}");
                    report.warnings.push(warning);
                }
                Err(err) => {
                    let warning = BacktestWarning::Failed {
                        ticker: ticker.clone(),
                        message: err.to_string(),
                    };
                    warn!("{warning}");
                    report.warnings.push(warning);
                }
            }
        }

        info!(
            succeeded = report.summary.len(),
            requested = tickers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "backtest batch complete"
        );

        report
    }

    //a panic inside one ticker's pipeline becomes that ticker's error
    //the cache recovers poisoned slot locks, so unwinding through it is safe
    fn run_ticker_isolated(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TickerOutcome, BacktestError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run_ticker(ticker, start, end)))
            .unwrap_or_else(|payload| Err(BacktestError::Panicked(panic_message(payload.as_ref()))))
    }

    //the whole pipeline for one ticker; errors stay local to this ticker
    pub fn run_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TickerOutcome, BacktestError> {
        let frame = self.cache.get_or_load(ticker, start, end, &self.engine)?;
        debug!(
            ticker,
            bars = frame.len(),
            first = %frame.series.first_date(),
            last = %frame.series.last_date(),
            "series ready"
        );
        let performance = self.analyzer.analyze(&frame.returns);

        let mut warnings = Vec::new();

        let required = self.engine.longest_window();
        if frame.len() < required {
            warnings.push(BacktestWarning::InsufficientHistory {
                ticker: ticker.to_string(),
                bars: frame.len(),
                required,
            });
        }

        if performance.has_degenerate_sharpe() {
            warnings.push(BacktestWarning::DegenerateStatistics {
                ticker: ticker.to_string(),
                sharpe: performance.sharpe_ratio,
            });
        }

        Ok(TickerOutcome {
            row: PerformanceSummaryRow::new(ticker, &performance),
            frame,
            warnings,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
