//property tests for pipeline invariants:
//every sma value is the mean of its trailing window, or undefined before the window fills
//positions are the signal shifted one bar
//signal follows the sign of fast - slow
//every derived column has the length of the price series

mod common;

use common::series_from;
use proptest::prelude::*;
use smabench::engine::returns::{daily_returns, lag_positions};
use smabench::prelude::*;

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), 1..120)
}

fn arb_windows() -> impl Strategy<Value = (usize, usize)> {
    (1usize..15, 1usize..40)
}

proptest! {
    #[test]
    fn sma_is_trailing_mean(closes in arb_closes(), window in 1usize..30) {
        let out = sma(&closes, window);
        prop_assert_eq!(out.len(), closes.len());

        for (i, value) in out.iter().enumerate() {
            if i + 1 < window {
                prop_assert!(value.is_none());
            } else {
                let slice = &closes[i + 1 - window..=i];
                let mean = slice.iter().sum::<f64>() / window as f64;
                let got = value.unwrap();
                prop_assert!((got - mean).abs() < 1e-9, "bar {}: {} vs {}", i, got, mean);
            }
        }
    }

    #[test]
    fn position_is_previous_signal(closes in arb_closes(), (fast, slow) in arb_windows()) {
        let frame = BacktestFrame::build(series_from(&closes), &SignalEngine::new(fast, slow, None));
        let signal = &frame.signals.signal;
        let position = &frame.returns.position;

        prop_assert_eq!(position[0], None);
        for i in 1..signal.len() {
            prop_assert_eq!(position[i], Some(signal[i - 1]));
        }
        prop_assert_eq!(lag_positions(signal), position.clone());
    }

    #[test]
    fn signal_follows_sma_ordering(closes in arb_closes(), (fast, slow) in arb_windows()) {
        let frame = SignalEngine::new(fast, slow, None).compute(&series_from(&closes));

        for i in 0..closes.len() {
            let expected = match (frame.sma_fast[i], frame.sma_slow[i]) {
                (Some(f), Some(s)) if f > s => Signal::Long,
                (Some(f), Some(s)) if f < s => Signal::Short,
                _ => Signal::Flat,
            };
            prop_assert_eq!(frame.signal[i], expected);
        }
    }

    #[test]
    fn all_columns_share_the_series_length(
        closes in arb_closes(),
        (fast, slow) in arb_windows(),
        trend in proptest::option::of(1usize..60),
    ) {
        let n = closes.len();
        let frame = BacktestFrame::build(series_from(&closes), &SignalEngine::new(fast, slow, trend));

        prop_assert_eq!(frame.len(), n);
        prop_assert_eq!(frame.signals.sma_fast.len(), n);
        prop_assert_eq!(frame.signals.sma_slow.len(), n);
        prop_assert_eq!(frame.signals.sma_trend.as_ref().map(Vec::len).unwrap_or(n), n);
        prop_assert_eq!(frame.signals.signal.len(), n);
        prop_assert_eq!(frame.returns.position.len(), n);
        prop_assert_eq!(frame.returns.daily_return.len(), n);
        prop_assert_eq!(frame.returns.strategy_return.len(), n);
        prop_assert_eq!(frame.growth_curves().len(), n);
    }

    #[test]
    fn strategy_return_is_exposure_times_daily(closes in arb_closes(), (fast, slow) in arb_windows()) {
        let frame = BacktestFrame::build(series_from(&closes), &SignalEngine::new(fast, slow, None));
        let daily = daily_returns(&closes);

        for i in 0..closes.len() {
            match (daily[i], frame.returns.position[i]) {
                (Some(r), Some(p)) => {
                    let got = frame.returns.strategy_return[i].unwrap();
                    prop_assert!((got - r * p.exposure()).abs() < 1e-12);
                }
                _ => prop_assert!(frame.returns.strategy_return[i].is_none()),
            }
        }
    }

    #[test]
    fn markers_mark_transitions_into_long_and_short(closes in arb_closes(), (fast, slow) in arb_windows()) {
        let frame = SignalEngine::new(fast, slow, None).compute(&series_from(&closes));
        let markers = frame.markers();

        for &i in &markers.entries {
            prop_assert_eq!(frame.signal[i], Signal::Long);
            prop_assert!(i == 0 || frame.signal[i - 1] != Signal::Long);
        }
        for &i in &markers.exits {
            prop_assert_eq!(frame.signal[i], Signal::Short);
            prop_assert!(i == 0 || frame.signal[i - 1] != Signal::Short);
        }
    }
}
