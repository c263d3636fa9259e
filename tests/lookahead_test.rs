//no-lookahead checks: values at bar i depend only on bars 0..=i
//run the full series and every truncation of it; each truncated run must be
//a prefix of the full run

mod common;

use common::{random_walk, series_from};
use smabench::prelude::*;

#[test]
fn truncated_history_is_a_prefix_of_full_history() {
    let closes = random_walk(180, 99);
    let engine = SignalEngine::new(5, 20, Some(60));
    let full = BacktestFrame::build(series_from(&closes), &engine);

    for cut in [1, 2, 19, 20, 21, 59, 60, 61, 120, 179] {
        let partial = BacktestFrame::build(series_from(&closes[..cut]), &engine);

        assert_eq!(partial.signals.sma_fast[..], full.signals.sma_fast[..cut], "cut {cut}");
        assert_eq!(partial.signals.sma_slow[..], full.signals.sma_slow[..cut], "cut {cut}");
        assert_eq!(partial.signals.signal[..], full.signals.signal[..cut], "cut {cut}");
        assert_eq!(partial.returns.position[..], full.returns.position[..cut], "cut {cut}");
        assert_eq!(
            partial.returns.strategy_return[..],
            full.returns.strategy_return[..cut],
            "cut {cut}"
        );
    }
}

#[test]
fn changing_a_future_close_leaves_the_past_alone() {
    let closes = random_walk(100, 3);
    let mut shocked = closes.clone();
    shocked[70] *= 3.0;

    let engine = SignalEngine::new(3, 10, None);
    let base = BacktestFrame::build(series_from(&closes), &engine);
    let moved = BacktestFrame::build(series_from(&shocked), &engine);

    assert_eq!(base.signals.signal[..70], moved.signals.signal[..70]);
    //the signal at 70 only becomes a position at 71
    assert_eq!(base.returns.position[..71], moved.returns.position[..71]);
    assert_eq!(base.returns.strategy_return[..70], moved.returns.strategy_return[..70]);
}

#[test]
fn todays_signal_earns_nothing_today() {
    //one big jump at the last bar flips the signal long on that bar only
    let mut closes = vec![100.0; 10];
    closes.push(200.0);
    let frame = BacktestFrame::build(series_from(&closes), &SignalEngine::new(1, 2, None));

    let last = closes.len() - 1;
    assert_eq!(frame.signals.signal[last], Signal::Long);
    assert_eq!(frame.returns.position[last], Some(Signal::Flat));
    assert_eq!(frame.returns.strategy_return[last], Some(0.0));
}
