use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use smabench::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "smabench")]
#[command(about = "A Rust-based multi-asset SMA crossover backtesting tool", long_about = None)]
struct Cli {
    //log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest over one or more tickers
    Run(RunArgs),

    //write a default json configuration
    InitConfig {
        #[arg(long, default_value = "smabench.json")]
        path: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    //json configuration file, flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    //comma-separated tickers (eg "AAPL, MSFT, TSLA")
    #[arg(long)]
    tickers: Option<String>,

    //first date, inclusive (yyyy-mm-dd)
    #[arg(long)]
    start: Option<NaiveDate>,

    //last date, exclusive (yyyy-mm-dd)
    #[arg(long)]
    end: Option<NaiveDate>,

    //fast sma window
    #[arg(long)]
    fast: Option<usize>,

    //slow sma window
    #[arg(long)]
    slow: Option<usize>,

    //trend sma window (display only)
    #[arg(long)]
    trend: Option<usize>,

    //worker threads
    #[arg(long)]
    workers: Option<usize>,

    //per-fetch timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    //csv file with date,symbol,open,high,low,close,volume (yahoo finance when absent)
    #[arg(long)]
    data: Option<PathBuf>,

    //output path for the summary csv
    #[arg(long)]
    output_csv: Option<PathBuf>,

    //directory for per-ticker series csv files
    #[arg(long)]
    series_dir: Option<PathBuf>,
}

impl RunArgs {
    fn apply(self, config: &mut BacktestConfiguration) {
        if let Some(tickers) = self.tickers {
            config.tickers = normalize_tickers(&tickers);
        }
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(end) = self.end {
            config.end = end;
        }
        if let Some(fast) = self.fast {
            config.sma.fast_window = fast;
        }
        if let Some(slow) = self.slow {
            config.sma.slow_window = slow;
        }
        if let Some(trend) = self.trend {
            config.sma.trend_window = Some(trend);
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout_secs {
            config.fetch_timeout_secs = Some(timeout);
        }
        if let Some(path) = self.data {
            config.provider = ProviderConfig::Csv { path };
        }
        if let Some(path) = self.output_csv {
            config.output_summary_csv = Some(path);
        }
        if let Some(dir) = self.series_dir {
            config.output_series_dir = Some(dir);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Run(args) => {
            let mut config = match &args.config {
                Some(path) => BacktestConfiguration::from_json_file(path)?,
                None => BacktestConfiguration::default(),
            };
            args.apply(&mut config);
            run_backtest(config)?;
        }
        Commands::InitConfig { path } => {
            BacktestConfiguration::default().to_json_file(&path)?;
            println!("Default configuration written to {:?}", path);
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => anyhow::bail!("Unknown log level: {}", other),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run_backtest(mut config: BacktestConfiguration) -> Result<()> {
    config.normalize();
    config.validate()?;

    println!("SMA Crossover Backtest");
    println!("======================\n");
    println!("Tickers: {}", config.tickers.join(", "));
    println!("Date range: {} to {}", config.start, config.end);
    println!(
        "Windows: fast={}, slow={}, trend={}\n",
        config.sma.fast_window,
        config.sma.slow_window,
        config
            .sma
            .trend_window
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    let provider = config.build_provider()?;
    let cache = Arc::new(SeriesCache::new(provider));
    let backtester = Backtester::new(cache, config.sma.to_engine(), config.workers)?;

    let report = backtester.run(&config.tickers, config.start, config.end);

    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }
    if !report.warnings.is_empty() {
        println!();
    }

    if report.summary.is_empty() {
        println!("No tickers could be processed.");
    } else {
        println!("Performance Summary");
        println!("===================\n");
        report.summary.pretty_print_table();
    }

    if let Some(path) = &config.output_summary_csv {
        report.summary.save_csv(path)?;
        println!("\nSummary saved to {:?}", path);
    }

    if let Some(dir) = &config.output_series_dir {
        save_series(&report, dir)?;
        println!("Series for {} ticker(s) saved to {:?}", report.series.len(), dir);
    }

    Ok(())
}

fn save_series(report: &BacktestReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).context(format!("Failed to create {:?}", dir))?;

    for (ticker, frame) in &report.series {
        frame.save_csv(&dir.join(format!("{ticker}.csv")))?;
    }

    Ok(())
}
