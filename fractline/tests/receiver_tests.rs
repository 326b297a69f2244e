use std::fs;
use std::path::PathBuf;

use fractline::{
    DataReceiver, FractalContext, FractalOptions, IngestError, RegisterError, ScanConfig, Timeframe,
    load_bars,
};

fn write_csv(name: &str, rows: &[(&str, f64, f64)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fractline-receiver-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    let mut text = String::from("datetime,open,high,low,close,volume\n");
    for (datetime, high, low) in rows {
        let mid = (high + low) / 2.0;
        text.push_str(&format!("{datetime},{mid},{high},{low},{mid},10\n"));
    }
    fs::write(&path, text).expect("write csv");
    path
}

fn hourly_rows() -> Vec<(String, f64, f64)> {
    let cycle = [0.0, 1.5, 3.0, 2.0, 0.5, 1.0, 2.5, 4.0, 2.0, 1.0];
    (0..40)
        .map(|i| {
            let level = 50.0 + cycle[i % cycle.len()] + (i / cycle.len()) as f64 * 0.25;
            (
                format!("2024-03-{:02} {:02}:00:00", 1 + i / 24, i % 24),
                level + 0.4,
                level - 0.4,
            )
        })
        .collect()
}

#[test]
fn streamed_and_replayed_csv_build_the_same_chain() {
    let rows = hourly_rows();
    let borrowed: Vec<(&str, f64, f64)> = rows.iter().map(|(d, h, l)| (d.as_str(), *h, *l)).collect();
    let path = write_csv("stream.csv", &borrowed);

    let mut streamed = DataReceiver::new(FractalContext::new("EURUSD"));
    streamed
        .register_timeframe(Timeframe::H1, FractalOptions::default())
        .expect("register");
    let streamed_found = streamed.ingest_csv(&path, Timeframe::H1).expect("ingest");
    assert_eq!(streamed.context().count(Timeframe::H1), 40);

    let mut replayed = DataReceiver::new(FractalContext::new("EURUSD"));
    let found = replayed
        .register_csv_history(&path, Timeframe::H1, FractalOptions::default())
        .expect("history");

    let streamed_chain = streamed.context().get_fractal_window(Timeframe::H1, usize::MAX);
    let replayed_chain = replayed.context().get_fractal_window(Timeframe::H1, usize::MAX);
    assert!(!streamed_chain.is_empty());
    assert_eq!(found, replayed_chain.len());
    assert_eq!(streamed_found, streamed_chain.len());
    assert_eq!(streamed_chain, replayed_chain);
}

#[test]
fn out_of_order_rows_are_dropped() {
    let path = write_csv(
        "unordered.csv",
        &[
            ("2024-03-01 00:00:00", 2.0, 1.0),
            ("2024-03-01 01:00:00", 3.0, 2.0),
            ("2024-03-01 00:30:00", 9.0, 0.0),
            ("2024-03-01 01:00:00", 9.0, 0.0),
            ("2024-03-01 02:00:00", 4.0, 3.0),
        ],
    );

    let bars = load_bars(&path).expect("load");
    assert_eq!(bars.len(), 3);
    assert_eq!(
        bars.iter().map(|b| b.high_price).collect::<Vec<_>>(),
        vec![2.0, 3.0, 4.0]
    );
    assert_eq!(bars[1].volume, 10.0);
}

#[test]
fn bad_datetime_surfaces_as_data_error() {
    let path = write_csv("broken.csv", &[("not a time", 2.0, 1.0)]);
    let mut receiver = DataReceiver::new(FractalContext::new("EURUSD"));
    receiver
        .register_timeframe(Timeframe::M1, FractalOptions::default())
        .expect("register");

    let err = receiver.ingest_csv(&path, Timeframe::M1).expect_err("invalid datetime");
    assert!(matches!(err, IngestError::Data(_)));
    assert_eq!(receiver.context().count(Timeframe::M1), 0);
}

#[test]
fn scan_config_loads_from_yaml_and_json_files() {
    let dir = std::env::temp_dir().join(format!("fractline-config-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");

    let yaml = dir.join("scan.yaml");
    fs::write(
        &yaml,
        "symbol: EURUSD\ntimeframes: \"m5, h1, m5\"\nprofile:\n  timeframe:\n    m5:\n      period: 7\n",
    )
    .expect("write yaml");
    let config = ScanConfig::from_file(&yaml).expect("yaml config");
    assert_eq!(config.symbol, "EURUSD");
    assert_eq!(
        config.timeframe_list().expect("timeframes"),
        vec![Timeframe::M5, Timeframe::H1]
    );
    assert_eq!(
        config.profile.resolve_for(Timeframe::M5).expect("m5").period,
        7
    );

    let json = dir.join("scan.json");
    fs::write(&json, r#"{"symbol": "XAUUSD", "chart_timeframe": "d1"}"#).expect("write json");
    let config = ScanConfig::from_file(&json).expect("json config");
    assert_eq!(config.timeframe_list().expect("timeframes"), vec![Timeframe::D1]);

    let toml = dir.join("scan.toml");
    fs::write(&toml, "symbol = 'x'").expect("write toml");
    assert!(ScanConfig::from_file(&toml).is_err());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn csv_history_for_registered_timeframe_is_rejected() {
    let rows = hourly_rows();
    let borrowed: Vec<(&str, f64, f64)> = rows.iter().map(|(d, h, l)| (d.as_str(), *h, *l)).collect();
    let path = write_csv("twice.csv", &borrowed);

    let mut receiver = DataReceiver::new(FractalContext::new("EURUSD"));
    receiver
        .register_csv_history(&path, Timeframe::H1, FractalOptions::default())
        .expect("first registration");
    let before = receiver.context().get_fractal_window(Timeframe::H1, usize::MAX);

    let err = receiver
        .register_csv_history(&path, Timeframe::H1, FractalOptions::default())
        .expect_err("second registration");
    assert!(matches!(err, RegisterError::AlreadyRegistered(Timeframe::H1)));
    assert_eq!(receiver.context().count(Timeframe::H1), 40);
    assert_eq!(receiver.context().get_fractal_window(Timeframe::H1, usize::MAX), before);
}
