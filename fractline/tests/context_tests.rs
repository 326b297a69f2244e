use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};

use fractline::{
    Bar, BarSeries, FractalContext, FractalEvent, FractalOptions, FractalProfileConfig,
    RegisterError, Side, Timeframe, notifier_listener, LogNotifier,
};

fn zigzag(count: usize, step_minutes: i64) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).single().expect("valid dt");
    let cycle = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0];
    (0..count)
        .map(|i| {
            let level = 100.0 + cycle[i % cycle.len()];
            Bar::new(base + Duration::minutes(i as i64 * step_minutes), level + 0.5, level - 0.5)
        })
        .collect()
}

#[test]
fn timeframes_keep_independent_chains_and_listeners() {
    let mut ctx = FractalContext::new("EURUSD");
    ctx.register(Timeframe::M5, FractalOptions::default()).expect("m5");
    ctx.register(Timeframe::H1, FractalOptions::new(7).expect("options")).expect("h1");

    let m5_events = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&m5_events);
    let id = ctx
        .subscribe(Timeframe::M5, move |_event: &FractalEvent, _chain| {
            *sink.lock().expect("lock") += 1;
            Ok(())
        })
        .expect("m5 registered");
    assert!(ctx.subscribe(Timeframe::D1, |_event, _chain| Ok(())).is_none());

    for bar in zigzag(60, 5) {
        ctx.append(Timeframe::M5, bar).expect("append m5");
    }

    assert_eq!(ctx.count(Timeframe::M5), 60);
    assert_eq!(ctx.count(Timeframe::H1), 0);
    assert!(ctx.get_fractal_window(Timeframe::H1, 10).is_empty());

    let m5_fractals = ctx.get_fractal_window(Timeframe::M5, usize::MAX);
    assert!(!m5_fractals.is_empty());
    assert_eq!(*m5_events.lock().expect("lock"), m5_fractals.len());
    assert!(m5_fractals.iter().all(|f| &*f.prefix == "5m"));

    assert!(ctx.unsubscribe(Timeframe::M5, id));
    assert!(!ctx.unsubscribe(Timeframe::M5, id));
    assert!(!ctx.unsubscribe(Timeframe::H1, id));
}

#[test]
fn zigzag_alternates_highs_and_lows() {
    let mut ctx = FractalContext::new("XAUUSD");
    ctx.register(Timeframe::M15, FractalOptions::default()).expect("m15");
    for bar in zigzag(40, 15) {
        ctx.append(Timeframe::M15, bar).expect("append");
    }

    let fractals = ctx.get_fractal_window(Timeframe::M15, usize::MAX);
    assert!(fractals.len() >= 4);
    for pair in fractals.windows(2) {
        assert_ne!(pair[0].side, pair[1].side);
    }
    for fractal in &fractals {
        match fractal.side {
            Side::High => assert_eq!(fractal.index % 6, 3),
            Side::Low => assert_eq!(fractal.index % 6, 0),
        }
    }

    let high = ctx
        .get_last_high_fractal(Timeframe::M15, false)
        .expect("high");
    assert_eq!(high.value, 103.5);
    let low = ctx.get_last_low_fractal(Timeframe::M15, true).expect("low");
    assert_eq!(low.value, 99.5);
    let (_, last) = ctx.get_last_fractal(Timeframe::M15, false).expect("last");
    assert_eq!(Some(last), fractals.last());

    // equal lows tie back to the first low of the run
    let (best_id, best) = ctx.get_last_fractal(Timeframe::M15, true).expect("best");
    assert_eq!(best.side, Side::Low);
    assert_eq!(best.index, 6);
    let detector = ctx.detector(Timeframe::M15).expect("detector");
    assert_eq!(detector.last_fractal(true), Some(best_id));
    assert_eq!(detector.last_low_fractal(true), Some(best_id));
}

#[test]
fn register_with_history_replays_before_live_updates() {
    let bars = zigzag(50, 60);
    let (history, live) = bars.split_at(30);

    let mut replayed = FractalContext::new("GBPUSD");
    let found = replayed
        .register_with_history(
            Timeframe::H1,
            FractalOptions::default(),
            BarSeries::from_bars(history.to_vec()),
        )
        .expect("register");
    assert_eq!(found, replayed.get_fractal_window(Timeframe::H1, usize::MAX).len());
    for bar in live {
        replayed.append(Timeframe::H1, bar.clone()).expect("append");
    }

    let mut streamed = FractalContext::new("GBPUSD");
    streamed.register(Timeframe::H1, FractalOptions::default()).expect("register");
    for bar in bars.iter().cloned() {
        streamed.append(Timeframe::H1, bar).expect("append");
    }

    assert_eq!(
        replayed.get_fractal_window(Timeframe::H1, usize::MAX),
        streamed.get_fractal_window(Timeframe::H1, usize::MAX)
    );
}

#[test]
fn history_for_registered_timeframe_is_rejected_not_dropped() {
    let mut ctx = FractalContext::new("EURUSD");
    ctx.register(Timeframe::H1, FractalOptions::default()).expect("register");

    let err = ctx
        .register_with_history(
            Timeframe::H1,
            FractalOptions::default(),
            BarSeries::from_bars(zigzag(60, 60)),
        )
        .expect_err("already registered");
    assert!(matches!(err, RegisterError::AlreadyRegistered(Timeframe::H1)));
    assert_eq!(err.to_string(), "timeframe already registered: 1h");
    assert_eq!(ctx.count(Timeframe::H1), 0);
}

#[test]
fn profile_registration_applies_per_timeframe_period() {
    let profile = FractalProfileConfig::from_yaml_str(
        "default:\n  period: 5\ntimeframe:\n  h4:\n    period: 9\n",
    )
    .expect("profile");
    let mut ctx = FractalContext::new("USDJPY");
    ctx.register_profile(&[Timeframe::M30, Timeframe::H4], &profile)
        .expect("register");

    assert_eq!(ctx.timeframes(), vec![Timeframe::M30, Timeframe::H4]);
    assert_eq!(
        ctx.detector(Timeframe::H4).map(|d| d.options().period),
        Some(9)
    );
    assert_eq!(
        ctx.detector(Timeframe::M30).map(|d| d.options().period),
        Some(5)
    );
}

#[test]
fn append_to_unregistered_timeframe_is_ignored() {
    let mut ctx = FractalContext::new("EURUSD");
    let found = ctx
        .append(Timeframe::D1, zigzag(1, 1440).remove(0))
        .expect("append");
    assert_eq!(found, 0);
    assert_eq!(ctx.count(Timeframe::D1), 0);
}

#[test]
fn notifier_listener_runs_inside_detection() {
    let mut ctx = FractalContext::new("EURUSD");
    ctx.register(Timeframe::M1, FractalOptions::default()).expect("m1");
    let detector = ctx.detector_mut(Timeframe::M1).expect("detector");
    detector.on_fractal_shared(notifier_listener("EURUSD", Timeframe::M1, Arc::new(LogNotifier)));

    for bar in zigzag(30, 1) {
        ctx.append(Timeframe::M1, bar).expect("append");
    }
    assert!(!ctx.get_fractal_window(Timeframe::M1, usize::MAX).is_empty());
}

#[test]
fn parquet_snapshot_is_written_per_timeframe() {
    let mut ctx = FractalContext::new("EURUSD");
    ctx.register(Timeframe::M5, FractalOptions::default()).expect("m5");
    for bar in zigzag(40, 5) {
        ctx.append(Timeframe::M5, bar).expect("append");
    }

    let dir = std::env::temp_dir().join(format!("fractline-snapshot-{}", std::process::id()));
    ctx.write_parquet_snapshot(Timeframe::M5, &dir).expect("snapshot");
    assert!(dir.join("fractal_5m.parquet").exists());

    // unregistered timeframes write nothing
    ctx.write_parquet_snapshot(Timeframe::H1, &dir).expect("noop");
    assert!(!dir.join("fractal_1h.parquet").exists());
    let _ = std::fs::remove_dir_all(&dir);
}
