//! Integration tests for support/resistance level detection.

use pivotscope::prelude::*;

fn bar(t: i64, high: f64, low: f64, volume: f64) -> Bar {
    let mid = (high + low) / 2.0;
    Bar::new(t, mid, high, low, mid, volume)
}

/// Saw-tooth highs in 90..=94, lows five below
fn background(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let high = 90.0 + (i % 5) as f64;
            bar(i as i64 * 60_000, high, high - 5.0, 1_000.0)
        })
        .collect()
}

#[test]
fn test_single_peak_scenario() {
    let mut bars = background(41);
    bars[20] = bar(20 * 60_000, 100.0, 95.0, 1_000.0);

    let levels = detect_levels(&bars, &LevelConfig::default()).unwrap();
    assert_eq!(levels.len(), 1);

    let level = levels[0];
    assert_eq!(level.kind, LevelKind::Resistance);
    assert_eq!(level.price, 100.0);
    assert!(level.strength.touches >= 1);
    assert_eq!(level.start_time, 0);
    assert_eq!(level.end_time, 40 * 60_000);
}

#[test]
fn test_unmistakable_local_high() {
    let period = 5;
    let mut bars = background(40);
    bars[17] = bar(17 * 60_000, 120.0, 110.0, 1_000.0);

    let config = LevelConfig::with_period(period).unwrap();
    let levels = detect_levels(&bars, &config).unwrap();

    let at_peak: Vec<_> = levels
        .iter()
        .filter(|l| l.kind == LevelKind::Resistance && l.price == 120.0)
        .collect();
    assert_eq!(at_peak.len(), 1);
}

#[test]
fn test_short_series_is_empty_not_error() {
    let bars = background(40);
    assert!(detect_levels(&bars, &LevelConfig::default()).unwrap().is_empty());

    let bars = background(10);
    let config = LevelConfig::with_period(5).unwrap();
    assert!(detect_levels(&bars, &config).unwrap().is_empty());
}

#[test]
fn test_empty_input_is_invalid() {
    let bars: Vec<Bar> = vec![];

    let err = detect_levels(&bars, &LevelConfig::default()).unwrap_err();
    assert!(err.is_invalid_input());

    let err = detect_patterns(&bars).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_invalid_bar_rejected_before_scan() {
    let mut bars = background(60);
    bars[30].low = bars[30].high + 1.0;

    assert!(matches!(
        detect_levels(&bars, &LevelConfig::default()),
        Err(AnalysisError::InvalidBar { index: 30, .. })
    ));
}

#[test]
fn test_touches_span_whole_series() {
    // Peak at 20 revisited at 75 and 85, both past the last pivot candidate
    let mut bars = background(91);
    bars[20] = bar(20 * 60_000, 100.0, 95.0, 1_000.0);
    bars[75] = bar(75 * 60_000, 100.05, 95.0, 4_000.0);
    bars[85] = bar(85 * 60_000, 99.95, 95.0, 1_000.0);

    let levels = detect_levels(&bars, &LevelConfig::default()).unwrap();
    let peak = levels
        .iter()
        .find(|l| l.kind == LevelKind::Resistance && l.price > 99.0)
        .expect("peak level");

    assert_eq!(peak.price, 100.0);
    assert_eq!(peak.strength.touches, 3);
    assert_eq!(peak.strength.average_volume, 2_000.0);
    assert_eq!(peak.strength.score, 6_000.0);
}

#[test]
fn test_results_are_capped_and_spread() {
    // Many distinct peaks and troughs
    let bars: Vec<Bar> = (0..400)
        .map(|i| {
            let x = i as f64;
            let high = 100.0 + (x * 0.11).sin() * 20.0 + (x * 0.37).cos() * 7.0 + 10.0;
            bar(i as i64, high, high - 3.0, 500.0 + (i % 17) as f64 * 40.0)
        })
        .collect();

    let config = LevelConfig::with_period(3).unwrap();
    let levels = detect_levels(&bars, &config).unwrap();

    assert!(!levels.is_empty());
    assert!(levels.len() <= 6);
    for (i, a) in levels.iter().enumerate() {
        for b in &levels[i + 1..] {
            assert!((a.price - b.price).abs() / a.price.min(b.price) >= 0.005);
        }
    }
    assert!(levels
        .windows(2)
        .all(|w| w[0].strength.score >= w[1].strength.score));
}

#[test]
fn test_custom_cap() {
    let bars: Vec<Bar> = (0..400)
        .map(|i| {
            let high = 100.0 + (i as f64 * 0.2).sin() * 30.0 + 40.0;
            bar(i as i64, high, high - 2.0, 1_000.0)
        })
        .collect();

    let config = LevelConfig {
        period: Period::new(4).unwrap(),
        max_levels: 2,
        ..LevelConfig::default()
    };
    assert!(detect_levels(&bars, &config).unwrap().len() <= 2);

    let zero = LevelConfig {
        max_levels: 0,
        ..LevelConfig::default()
    };
    assert!(matches!(
        detect_levels(&bars, &zero),
        Err(AnalysisError::InvalidConfig(_))
    ));
}

#[test]
fn test_analysis_json() {
    let mut bars = background(41);
    bars[20] = bar(20 * 60_000, 100.0, 95.0, 1_000.0);

    let analysis = analyze(&bars, &LevelConfig::default(), &PatternClassifier::default()).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();

    let level = &json["levels"][0];
    assert_eq!(level["type"], "resistance");
    assert_eq!(level["price"], 100.0);
    assert_eq!(level["startTime"], 0);
    assert_eq!(level["strength"]["touches"], 1);
    assert_eq!(level["strength"]["averageVolume"], 1_000.0);
}
