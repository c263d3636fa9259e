use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//growth of $1 at one bar, for strategy and buy-and-hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub strategy: Option<f64>,
    pub buy_hold: Option<f64>,
}

//exp of the running sum of returns
//undefined bars stay undefined and do not move the running sum
pub fn growth_curve(returns: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut running = 0.0;

    returns
        .iter()
        .map(|ret| {
            ret.map(|r| {
                running += r;
                running.exp()
            })
        })
        .collect()
}

//pairs both growth curves with their dates
pub fn calculate_growth_curves(
    dates: &[NaiveDate],
    strategy_returns: &[Option<f64>],
    daily_returns: &[Option<f64>],
) -> Vec<GrowthPoint> {
    let strategy = growth_curve(strategy_returns);
    let buy_hold = growth_curve(daily_returns);

    dates
        .iter()
        .zip(strategy)
        .zip(buy_hold)
        .map(|((&date, strategy), buy_hold)| GrowthPoint {
            date,
            strategy,
            buy_hold,
        })
        .collect()
}
