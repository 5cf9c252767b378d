mod common;

use common::{Kline, month_of_klines, write_archive};
use kline_features::application::features::engine::{FeatureEngine, compute_features};
use kline_features::application::market_data::archive_reader::read_archive;
use kline_features::domain::candle::CandleTable;
use kline_features::domain::errors::PipelineError;
use kline_features::domain::ports::ColumnSource;
use kline_features::domain::value::Value;

fn table(klines: &[Kline]) -> CandleTable {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "t.zip", klines);
    read_archive(&path).unwrap()
}

fn assert_close(actual: Value, expected: f64) {
    match actual {
        Value::Number(x) => assert!(
            (x - expected).abs() < 1e-9,
            "expected {expected}, got {x}"
        ),
        Value::Undefined => panic!("expected {expected}, got undefined"),
    }
}

#[test]
fn test_log_return_zero_close_and_successor_are_undefined() {
    let closes = [100.0, 105.0, 0.0, 95.0];
    let klines: Vec<Kline> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Kline::new(i as i64, c, 1.0))
        .collect();

    let features = compute_features(&table(&klines)).unwrap();
    let lr = features.numeric_column("log_return").unwrap();

    assert_eq!(lr[0], Value::Undefined);
    assert_close(lr[1], 1.05f64.ln());
    assert_eq!(lr[2], Value::Undefined);
    assert_eq!(lr[3], Value::Undefined);
}

#[test]
fn test_volume_zscore_needs_twenty_observations() {
    let features = compute_features(&table(&month_of_klines(0, 19))).unwrap();
    assert!(
        features
            .numeric_column("volume_zscore")
            .unwrap()
            .iter()
            .all(Value::is_undefined)
    );

    let features = compute_features(&table(&month_of_klines(0, 25))).unwrap();
    let z = features.numeric_column("volume_zscore").unwrap();
    assert!(z[..19].iter().all(Value::is_undefined));
    assert!(z[19].is_defined());
}

#[test]
fn test_volume_zscore_matches_trailing_window() {
    let klines = month_of_klines(0, 80);
    let features = compute_features(&table(&klines)).unwrap();
    let z = features.numeric_column("volume_zscore").unwrap();

    // Row 70 sees rows 11..=70
    let window: Vec<f64> = klines[11..=70]
        .iter()
        .map(|k| k.volume.parse::<f64>().unwrap())
        .collect();
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let std = (window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    let current = klines[70].volume.parse::<f64>().unwrap();

    assert_close(z[70], (current - mean) / std);
}

#[test]
fn test_close_sma_starts_at_tenth_row() {
    let klines = month_of_klines(0, 40);
    let features = compute_features(&table(&klines)).unwrap();
    let sma = features.numeric_column("close_sma_30").unwrap();

    assert_eq!(sma[8], Value::Undefined);
    let first_ten: f64 = klines[..10]
        .iter()
        .map(|k| k.close.parse::<f64>().unwrap())
        .sum::<f64>()
        / 10.0;
    assert_close(sma[9], first_ten);

    let last_thirty: f64 = klines[10..40]
        .iter()
        .map(|k| k.close.parse::<f64>().unwrap())
        .sum::<f64>()
        / 30.0;
    assert_close(sma[39], last_thirty);
}

#[test]
fn test_undefined_inputs_propagate() {
    let mut klines = month_of_klines(0, 3);
    klines[1].low = "bad".to_string();
    klines[2].close = String::new();

    let features = compute_features(&table(&klines)).unwrap();
    let rows = features.rows();

    assert_eq!(rows[1].spread, Value::Undefined);
    assert_eq!(rows[1].hlc3, Value::Undefined);
    assert_eq!(rows[2].hlc3, Value::Undefined);
    assert_eq!(rows[2].log_return, Value::Undefined);
    assert!(rows[0].hlc3.is_defined());
}

#[test]
fn test_compute_features_is_idempotent_and_pure() {
    let input = table(&month_of_klines(0, 120));
    let snapshot = input.clone();

    let first = compute_features(&input).unwrap();
    let second = compute_features(&input).unwrap();

    assert_eq!(first, second);
    assert_eq!(input, snapshot);
    assert_eq!(first.len(), input.len());
    for (feature, candle) in first.rows().iter().zip(input.rows()) {
        assert_eq!(&feature.candle, candle);
    }
}

#[test]
fn test_engine_rejects_table_without_volume() {
    struct NoVolume(CandleTable);

    impl ColumnSource for NoVolume {
        fn row_count(&self) -> usize {
            self.0.row_count()
        }

        fn numeric_column(&self, name: &str) -> Option<Vec<Value>> {
            if name == "volume" {
                None
            } else {
                self.0.numeric_column(name)
            }
        }
    }

    let source = NoVolume(table(&month_of_klines(0, 5)));
    let err = FeatureEngine::default().derive(&source).unwrap_err();
    match err {
        PipelineError::Schema(msg) => {
            assert!(msg.ends_with("required columns: volume"), "{msg}")
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}
