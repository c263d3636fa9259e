use crate::data::PriceSeries;
use crate::strategy::{defined, Signal};
use serde::Serialize;

//positions and per-bar returns, index-aligned with the price series
#[derive(Debug, Clone, Serialize)]
pub struct ReturnFrame {
    pub position: Vec<Option<Signal>>,
    pub daily_return: Vec<Option<f64>>,
    pub strategy_return: Vec<Option<f64>>,
}

//turns signals into lagged positions and simple returns
//no costs, no sizing: exposure is the position value applied to the daily return
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionReturnEngine;

impl PositionReturnEngine {
    pub fn compute(&self, series: &PriceSeries, signal: &[Signal]) -> ReturnFrame {
        debug_assert_eq!(series.len(), signal.len());

        let position = lag_positions(signal);
        let daily_return = daily_returns(&series.closes());
        let strategy_return = strategy_returns(&daily_return, &position);

        ReturnFrame {
            position,
            daily_return,
            strategy_return,
        }
    }
}

//position[i] = signal[i - 1]; a signal seen at the close of bar i is only tradable from bar i + 1
pub fn lag_positions(signal: &[Signal]) -> Vec<Option<Signal>> {
    let mut position = Vec::with_capacity(signal.len());
    if !signal.is_empty() {
        position.push(None);
        position.extend(signal[..signal.len() - 1].iter().copied().map(Some));
    }
    position
}

//close[i] / close[i - 1] - 1, undefined at bar 0 and wherever the ratio is NaN
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if !closes.is_empty() {
        out.push(None);
        out.extend(closes.windows(2).map(|w| defined(w[1] / w[0] - 1.0)));
    }
    out
}

pub fn strategy_returns(daily: &[Option<f64>], position: &[Option<Signal>]) -> Vec<Option<f64>> {
    daily
        .iter()
        .zip(position)
        .map(|(ret, pos)| match (ret, pos) {
            (Some(r), Some(p)) => defined(r * p.exposure()),
            _ => None,
        })
        .collect()
}
