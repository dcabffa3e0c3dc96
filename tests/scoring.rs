//! Scenario tests for the full scoring pipeline.

use dca_scorer::indicators::Series;
use dca_scorer::prelude::*;
use dca_scorer::scorers::trend;

/// Caller-side bar type, scored through the `OHLCV` trait
#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        self.v
    }
}

fn flat(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| Candle::new(i as i64, 100.0, 100.0, 100.0, 100.0, 1000.0))
        .collect()
}

/// Range 99..101, closes alternating 100.4 / 99.8, volume 1000
fn sideways(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let c = if i % 2 == 0 { 100.4 } else { 99.8 };
            Candle::new(i as i64, 100.0, 101.0, 99.0, c, 1000.0)
        })
        .collect()
}

fn with_last(mut bars: Vec<Candle>, o: f64, h: f64, l: f64, c: f64, v: f64) -> Vec<Candle> {
    let ts = bars.len() as i64;
    bars.push(Candle::new(ts, o, h, l, c, v));
    bars
}

fn scaled(bars: &[Candle], k: f64) -> Vec<Candle> {
    bars.iter()
        .map(|b| Candle::new(b.timestamp, b.open * k, b.high * k, b.low * k, b.close * k, b.volume))
        .collect()
}

fn score(bars: &[Candle]) -> ScanResult {
    DcaScorer::default()
        .score("TEST", Market::Crypto, bars)
        .unwrap()
}

#[test]
fn test_flat_series_scores_only_accumulation_and_atr() {
    let r = score(&flat(60));
    let d = &r.score_details;

    assert_eq!(r.levels.support, 100.0);
    assert_eq!(r.levels.resistance, 100.0);
    assert_eq!(r.levels.height, 0.0);
    assert_eq!(r.range_pct, 0.0);

    assert_eq!(d.range_width_score, 10.0);
    assert_eq!(d.range_position_score, 10.0);
    assert_eq!(d.accumulation, 20.0);
    assert_eq!(d.atr, 10.0);
    assert_eq!(d.churn_penalty, 0.0);

    assert_eq!(d.spring, 0.0);
    assert_eq!(d.obv, 0.0);
    assert_eq!(d.volume, 0.0);
    assert_eq!(d.breakout_proximity, 0.0);
    assert_eq!(d.ema_cross, 0.0);
    assert_eq!(d.rsi_recovery, 0.0);
    assert_eq!(d.golden_cross_bonus, 0.0);

    assert_eq!(r.score, 30.0);
    assert_eq!(r.category, Category::Neutral);
    assert!(!r.flags.breakout);
    assert!(!r.flags.near_breakout);
    assert!(!r.flags.dip_reclaim);
    assert!(r.flags.dca);
    assert_eq!(r.vol_ratio, 1.0);
    assert_eq!(r.avwap, 100.0);
}

#[test]
fn test_spring_bar_scores_near_max() {
    let bars = with_last(sideways(59), 100.0, 100.5, 98.5, 100.2, 2000.0);
    let r = score(&bars);
    let d = &r.score_details;

    assert_eq!(r.levels.support, 99.0);
    assert_eq!(d.spring_wick_score, 7.0);
    assert_eq!(d.spring_pos_score, 4.0);
    assert_eq!(d.spring_support_score, 4.0);
    assert_eq!(d.spring_vol_bonus, 1.0);
    assert_eq!(d.spring, 15.0);
    assert_eq!(d.spring_volume_score, 3.0);
    assert!(r.flags.dip_reclaim);
    assert!(!r.flags.breakout);
    assert!((r.vol_ratio - 2.0).abs() < 1e-12);
}

#[test]
fn test_golden_cross_window() {
    let slow = Series::new(0, vec![100.0; 30]);

    // crossed 5 bars before the latest, gap still widening
    let recent: Vec<f64> = (0..30)
        .map(|i| if i < 24 { 99.0 } else { 100.0 + (i - 23) as f64 })
        .collect();
    let recent = Series::new(0, recent);
    assert_eq!(trend::bars_since_cross_up(&recent, &slow, 29, 10), Some(5));
    assert_eq!(trend::golden_cross(&recent, &slow, 29, 10), 2.0);

    // same shape, crossed 11 bars before the latest
    let old: Vec<f64> = (0..30)
        .map(|i| if i < 18 { 99.0 } else { 100.0 + (i - 17) as f64 })
        .collect();
    let old = Series::new(0, old);
    assert_eq!(trend::golden_cross(&old, &slow, 29, 10), 0.0);
}

#[test]
fn test_breakout_with_volume() {
    let bars = with_last(sideways(59), 100.8, 103.0, 100.6, 102.5, 2500.0);
    let r = score(&bars);

    assert!(r.close > r.levels.resistance);
    assert!(r.flags.breakout);
    assert!(!r.flags.near_breakout);
    assert!(!r.flags.dca);
    assert_eq!(r.score_details.breakout_volume_score, 3.0);
    assert_eq!(r.score_details.breakout_proximity, 0.0);
}

#[test]
fn test_breakout_from_flat_base() {
    let bars = with_last(flat(59), 100.0, 105.5, 100.0, 105.0, 2500.0);
    let r = score(&bars);

    assert_eq!(r.levels.resistance, 100.0);
    assert_eq!(r.levels.height, 0.0);
    assert!(r.flags.breakout);
    assert!(!r.flags.near_breakout);
    assert!(!r.flags.dca);
    assert_eq!(r.score_details.breakout_volume_score, 3.0);
    assert_eq!(r.score_details.breakout_proximity, 0.0);
}

#[test]
fn test_dip_reclaim_in_narrow_range_is_not_near_breakout() {
    // 99..101 sits entirely inside 3% of RH
    let bars = with_last(sideways(59), 99.0, 99.4, 98.5, 99.2, 2000.0);
    let r = score(&bars);
    let d = &r.score_details;

    assert!(r.flags.dip_reclaim);
    assert!(!r.flags.near_breakout);
    assert!(!r.flags.breakout);
    assert_eq!(d.spring_volume_score, 3.0);
    assert_eq!(d.breakout_volume_score, 0.0);
    assert_eq!(d.volume, 3.0);
}

#[test]
fn test_scores_independent_of_price_scale() {
    let bars = with_last(sideways(59), 100.0, 100.5, 98.5, 100.2, 2000.0);
    let base = score(&bars);
    let k = 2f64.powi(-70);
    let tiny = score(&scaled(&bars, k));

    assert_eq!(tiny.score_details, base.score_details);
    assert_eq!(tiny.score, base.score);
    assert_eq!(tiny.category, base.category);
    assert_eq!(tiny.flags, base.flags);
    assert_eq!(tiny.levels.support, base.levels.support * k);
    assert!(tiny.score_details.atr > 0.0);
}

#[test]
fn test_minimum_length_boundary() {
    let scorer = DcaScorer::default();
    assert!(scorer.score("X", Market::Us, &sideways(50)).is_ok());
    assert_eq!(
        scorer.score("X", Market::Us, &sideways(49)).unwrap_err(),
        ScoreError::InsufficientData { need: 50, got: 49 }
    );

    let strict = ScorerBuilder::new().min_bars(60).unwrap().build().unwrap();
    assert!(strict.score("X", Market::Us, &sideways(60)).is_ok());
    assert!(matches!(
        strict.score("X", Market::Us, &sideways(59)),
        Err(ScoreError::InsufficientData { need: 60, got: 59 })
    ));
}

#[test]
fn test_malformed_series_rejected() {
    let mut bars = sideways(60);
    bars[3].low = -1.0;
    assert!(matches!(
        DcaScorer::default().score("X", Market::Us, &bars),
        Err(ScoreError::MalformedCandle { index: 3, .. })
    ));

    let mut bars = sideways(60);
    bars[12].open = 101.5;
    assert!(matches!(
        DcaScorer::default().score("X", Market::Us, &bars),
        Err(ScoreError::MalformedCandle { index: 12, .. })
    ));

    let mut bars = sideways(60);
    bars[59].close = f64::NAN;
    assert!(matches!(
        DcaScorer::default().score("X", Market::Us, &bars),
        Err(ScoreError::MalformedCandle { index: 59, .. })
    ));
}

#[test]
fn test_range_window_length() {
    // bars 19..79 form the default window; a 20-bar window starts at 59
    let mut bars = sideways(80);
    bars[30].high = 150.0;
    let r = score(&bars);
    assert_eq!(r.levels.resistance, 150.0);

    let narrow = ScorerBuilder::new().range_window(20).unwrap().build().unwrap();
    let r = narrow.score("X", Market::Us, &bars).unwrap();
    assert_eq!(r.levels.resistance, 101.0);
}

#[test]
fn test_custom_bar_type() {
    let bars: Vec<TestBar> = (0..70)
        .map(|i| {
            let c = 50.0 + (i % 4) as f64 * 0.25;
            TestBar {
                o: 50.0,
                h: 51.0,
                l: 49.5,
                c,
                v: 500.0 + (i % 3) as f64 * 10.0,
            }
        })
        .collect();
    let r = DcaScorer::default()
        .score("CUSTOM", Market::Fx, &bars)
        .unwrap();
    assert_eq!(r.levels.support, 49.5);
    assert_eq!(r.levels.resistance, 51.0);
    assert!(r.levels.support <= r.levels.value_area_low);
    assert!(r.levels.value_area_low <= r.levels.resistance);
    assert!((0.0..=100.0).contains(&r.score));
}

#[test]
fn test_trade_plan_from_result() {
    let r = score(&sideways(60));
    let plan = TradePlan::from_result(&r);
    assert_eq!(plan.entries.retest, r.levels.resistance);
    assert!(plan.stops.breakout < plan.entries.breakout);
    assert!(plan.stops.dca < plan.entries.dca_avg);
    assert!((plan.spring_low - 0.95 * r.levels.support).abs() < 1e-12);
}

#[test]
fn test_parallel_scan_orders_and_isolates_failures() {
    let requests = vec![
        ScanRequest {
            symbol: "FLAT".into(),
            market: Market::Crypto,
            timeframe: Timeframe::Daily,
            candles: flat(60),
        },
        ScanRequest {
            symbol: "SHORT".into(),
            market: Market::Crypto,
            timeframe: Timeframe::Daily,
            candles: flat(5),
        },
        ScanRequest {
            symbol: "SPRING".into(),
            market: Market::Crypto,
            timeframe: Timeframe::FourHour,
            candles: with_last(sideways(59), 100.0, 100.5, 98.5, 100.2, 2000.0),
        },
    ];

    let (results, errors) = scan_parallel(&DcaScorer::default(), &requests);
    assert_eq!(results.len(), 2);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].symbol, "SHORT");
    assert!(matches!(errors[0].error, ScoreError::InsufficientData { .. }));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

    let serial: Vec<_> = requests
        .iter()
        .filter_map(|r| DcaScorer::default().scan(r).ok())
        .collect();
    for r in &results {
        assert!(serial.contains(r));
    }
}
