use crate::metrics::performance::Performance;
use anyhow::{Context, Result};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

pub const SUMMARY_HEADER: [&str; 4] = [
    "Ticker",
    "Strategy Growth(×)",
    "BuyHold Growth(×)",
    "Sharpe Ratio",
];

//one row per successfully processed ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummaryRow {
    pub ticker: String,
    pub strategy_growth: f64,
    pub buy_hold_growth: f64,
    pub sharpe_ratio: f64,
}

impl PerformanceSummaryRow {
    pub fn new(ticker: impl Into<String>, performance: &Performance) -> Self {
        PerformanceSummaryRow {
            ticker: ticker.into(),
            strategy_growth: performance.strategy_growth,
            buy_hold_growth: performance.buy_hold_growth,
            sharpe_ratio: performance.sharpe_ratio,
        }
    }

    //values rounded to two places, NaN and inf spelled out
    fn formatted(&self) -> [String; 4] {
        [
            self.ticker.clone(),
            format!("{:.2}", self.strategy_growth),
            format!("{:.2}", self.buy_hold_growth),
            format!("{:.2}", self.sharpe_ratio),
        ]
    }
}

//ordered summary table, duplicate tickers allowed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    rows: Vec<PerformanceSummaryRow>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: PerformanceSummaryRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[PerformanceSummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.ticker.as_str()).collect()
    }

    //first row for a ticker
    pub fn get(&self, ticker: &str) -> Option<&PerformanceSummaryRow> {
        self.rows.iter().find(|r| r.ticker == ticker)
    }

    //writes the table as csv with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(SUMMARY_HEADER)?;

        for row in &self.rows {
            csv.write_record(row.formatted())?;
        }

        csv.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).context("summary csv is not valid UTF-8")
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .context(format!("Failed to create summary file {:?}", path))?;
        self.write_csv(file)
    }

    //prints the table to stdout
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(
            SUMMARY_HEADER.iter().map(|h| Cell::new(h)).collect(),
        ));

        for row in &self.rows {
            table.add_row(Row::new(
                row.formatted().iter().map(|v| Cell::new(v)).collect(),
            ));
        }

        table.printstd();
    }
}

impl FromIterator<PerformanceSummaryRow> for SummaryTable {
    fn from_iter<I: IntoIterator<Item = PerformanceSummaryRow>>(iter: I) -> Self {
        SummaryTable {
            rows: iter.into_iter().collect(),
        }
    }
}
