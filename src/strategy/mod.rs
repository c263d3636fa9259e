pub mod sma_crossover;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use sma_crossover::{CrossoverMarkers, SignalEngine, SignalFrame};

//directional stance derived from the sma comparison
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Short,
    #[default]
    Flat,
    Long,
}

impl Signal {
    //exposure multiplier applied to the daily return
    pub fn exposure(self) -> f64 {
        self.as_i8() as f64
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

//treats NaN as "no value"
pub fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

//trailing simple moving average, same length as the input
//index i is None until a full window is available, or if any close in the window is NaN
pub fn sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() < window {
        return out;
    }

    for (offset, win) in closes.windows(window).enumerate() {
        let mean = win.iter().sum::<f64>() / window as f64;
        out[offset + window - 1] = defined(mean);
    }

    out
}
