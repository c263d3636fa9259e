use crate::data::PriceSeries;
use crate::strategy::{sma, Signal};
use serde::Serialize;

//sma crossover signal engine
//long while the fast sma is above the slow sma, short while below, flat otherwise
//the optional trend window is computed for display and never affects the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalEngine {
    fast_window: usize,
    slow_window: usize,
    trend_window: Option<usize>,
}

//smas and signal for one series, index-aligned with its bars
#[derive(Debug, Clone, Serialize)]
pub struct SignalFrame {
    pub sma_fast: Vec<Option<f64>>,
    pub sma_slow: Vec<Option<f64>>,
    pub sma_trend: Option<Vec<Option<f64>>>,
    pub signal: Vec<Signal>,
}

//bar indices where the stance flips into long (entries) or into short (exits)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossoverMarkers {
    pub entries: Vec<usize>,
    pub exits: Vec<usize>,
}

impl SignalEngine {
    pub fn new(fast_window: usize, slow_window: usize, trend_window: Option<usize>) -> Self {
        SignalEngine {
            fast_window,
            slow_window,
            trend_window,
        }
    }

    pub fn fast_window(&self) -> usize {
        self.fast_window
    }

    pub fn slow_window(&self) -> usize {
        self.slow_window
    }

    pub fn trend_window(&self) -> Option<usize> {
        self.trend_window
    }

    //longest window requested, including the display-only trend window
    pub fn longest_window(&self) -> usize {
        self.fast_window
            .max(self.slow_window)
            .max(self.trend_window.unwrap_or(0))
    }

    pub fn compute(&self, series: &PriceSeries) -> SignalFrame {
        let closes = series.closes();

        let sma_fast = sma(&closes, self.fast_window);
        let sma_slow = sma(&closes, self.slow_window);
        let sma_trend = self.trend_window.map(|w| sma(&closes, w));
        let signal = signals(&sma_fast, &sma_slow);

        SignalFrame {
            sma_fast,
            sma_slow,
            sma_trend,
            signal,
        }
    }
}

//default flat, then long where fast > slow, then short where fast < slow
//an undefined side fails both comparisons and stays flat
pub fn signals(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<Signal> {
    let mut out = vec![Signal::Flat; fast.len()];

    for (i, pair) in fast.iter().zip(slow).enumerate() {
        if let (Some(f), Some(s)) = pair {
            if f > s {
                out[i] = Signal::Long;
            }
            if f < s {
                out[i] = Signal::Short;
            }
        }
    }

    out
}

impl CrossoverMarkers {
    //a bar with no predecessor counts as a change
    pub fn from_signals(signal: &[Signal]) -> Self {
        let mut markers = CrossoverMarkers::default();

        for (i, &current) in signal.iter().enumerate() {
            let previous = i.checked_sub(1).map(|p| signal[p]);

            if current == Signal::Long && previous != Some(Signal::Long) {
                markers.entries.push(i);
            }
            if current == Signal::Short && previous != Some(Signal::Short) {
                markers.exits.push(i);
            }
        }

        markers
    }
}

impl SignalFrame {
    pub fn markers(&self) -> CrossoverMarkers {
        CrossoverMarkers::from_signals(&self.signal)
    }
}
