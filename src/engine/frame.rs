use crate::data::PriceSeries;
use crate::engine::returns::{PositionReturnEngine, ReturnFrame};
use crate::metrics::timeseries::{calculate_growth_curves, GrowthPoint};
use crate::strategy::{CrossoverMarkers, SignalEngine, SignalFrame};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

const SERIES_HEADER: [&str; 11] = [
    "date",
    "close",
    "sma_fast",
    "sma_slow",
    "sma_trend",
    "signal",
    "position",
    "daily_return",
    "strategy_return",
    "strategy_growth",
    "buy_hold_growth",
];

//the loaded price series plus every derived column, all index-aligned
#[derive(Debug, Clone, Serialize)]
pub struct BacktestFrame {
    pub series: PriceSeries,
    pub signals: SignalFrame,
    pub returns: ReturnFrame,
}

impl BacktestFrame {
    pub fn build(series: PriceSeries, engine: &SignalEngine) -> Self {
        let signals = engine.compute(&series);
        let returns = PositionReturnEngine.compute(&series, &signals.signal);

        BacktestFrame {
            series,
            signals,
            returns,
        }
    }

    pub fn ticker(&self) -> &str {
        self.series.ticker()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn markers(&self) -> CrossoverMarkers {
        self.signals.markers()
    }

    pub fn growth_curves(&self) -> Vec<GrowthPoint> {
        calculate_growth_curves(
            &self.series.dates(),
            &self.returns.strategy_return,
            &self.returns.daily_return,
        )
    }

    //writes every column as csv, undefined values as empty fields
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(SERIES_HEADER)?;

        let growth = self.growth_curves();

        for (i, bar) in self.series.bars().iter().enumerate() {
            let trend = self
                .signals
                .sma_trend
                .as_ref()
                .and_then(|trend| trend[i]);

            csv.write_record([
                bar.date.format("%Y-%m-%d").to_string(),
                bar.close.to_string(),
                field(self.signals.sma_fast[i]),
                field(self.signals.sma_slow[i]),
                field(trend),
                self.signals.signal[i].to_string(),
                self.returns.position[i]
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                field(self.returns.daily_return[i]),
                field(self.returns.strategy_return[i]),
                field(growth[i].strategy),
                field(growth[i].buy_hold),
            ])?;
        }

        csv.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .context(format!("Failed to create series file {:?}", path))?;
        self.write_csv(file)
    }
}

fn field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
