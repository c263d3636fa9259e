use crate::engine::returns::ReturnFrame;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

//scalar performance for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub strategy_growth: f64,
    pub buy_hold_growth: f64,
    pub sharpe_ratio: f64,
}

impl Performance {
    pub fn has_degenerate_sharpe(&self) -> bool {
        !self.sharpe_ratio.is_finite()
    }
}

//reduces return series to growth multiples and an annualized sharpe ratio
#[derive(Debug, Clone, Copy)]
pub struct PerformanceAnalyzer {
    periods_per_year: f64,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        PerformanceAnalyzer {
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl PerformanceAnalyzer {
    pub fn new(periods_per_year: f64) -> Self {
        PerformanceAnalyzer { periods_per_year }
    }

    pub fn analyze(&self, returns: &ReturnFrame) -> Performance {
        Performance {
            strategy_growth: growth_multiple(&returns.strategy_return),
            buy_hold_growth: growth_multiple(&returns.daily_return),
            sharpe_ratio: self.sharpe_ratio(&returns.strategy_return),
        }
    }

    //mean / sample std * sqrt(periods), no risk-free rate
    //zero variance or fewer than two observations gives a non-finite result, left as is
    pub fn sharpe_ratio(&self, returns: &[Option<f64>]) -> f64 {
        let values: Vec<f64> = returns.iter().flatten().copied().collect();

        let mean = values.iter().mean();
        let std_dev = values.iter().std_dev();

        mean / std_dev * self.periods_per_year.sqrt()
    }
}

//exp of the summed returns, skipping undefined bars
//compounds simple returns as if they were log returns; kept that way so outputs stay comparable
pub fn growth_multiple(returns: &[Option<f64>]) -> f64 {
    returns.iter().flatten().sum::<f64>().exp()
}
