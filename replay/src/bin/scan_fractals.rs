use std::path::PathBuf;
use std::sync::Arc;

use fractline::{
    DataReceiver, FractalContext, ListenerError, LogNotifier, Timeframe, init_logging,
    notifier_listener,
};
use replay::{FractalRecord, ScanSummary, load_scan_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "usage: cargo run -q -p replay --bin scan_fractals -- <csv_path> <symbol> <timeframe:1m|5m|15m|1h|1d> [config.yaml|json] [--notify]"
        );
        std::process::exit(2);
    }

    init_logging();

    let csv_path = PathBuf::from(&args[1]);
    let symbol = args[2].clone();
    let timeframe = Timeframe::parse(&args[3])?;
    let config_path = args.get(4).map(String::as_str).filter(|x| !x.starts_with("--"));
    let notify = args.iter().skip(4).any(|x| x == "--notify");

    let config = load_scan_config(config_path, &symbol, timeframe)?;
    let options = config.profile.resolve_for(timeframe)?;

    let mut receiver = DataReceiver::new(FractalContext::new(symbol.clone()));
    receiver.register_timeframe(timeframe, options)?;
    receiver.context_mut().subscribe(timeframe, |event, chain| {
        let record = FractalRecord::from_chain(chain, event.fractal_id)
            .ok_or_else(|| ListenerError::new("fractal missing from chain"))?;
        let line = serde_json::to_string(&record).map_err(|e| ListenerError::new(e.to_string()))?;
        println!("{line}");
        Ok(())
    });
    if notify {
        if let Some(detector) = receiver.context_mut().detector_mut(timeframe) {
            detector.on_fractal_shared(notifier_listener(symbol.clone(), timeframe, Arc::new(LogNotifier)));
        }
    }

    receiver.ingest_csv(&csv_path, timeframe)?;

    let context = receiver.context();
    let Some(detector) = context.detector(timeframe) else {
        return Ok(());
    };
    let bars = context.count(timeframe);
    let summary = ScanSummary::from_chain(detector.chain());
    println!(
        "SCAN summary: symbol={} timeframe={} period={} bars={} fractals={} highs={} lows={} higher_highs={} lower_lows={} fakes={}",
        symbol,
        timeframe,
        detector.options().period,
        bars,
        summary.fractals,
        summary.highs,
        summary.lows,
        summary.higher_highs,
        summary.lower_lows,
        summary.fakes,
    );

    if let Some(high) = context.get_last_high_fractal(timeframe, true) {
        println!("SCAN best high: index={} datetime={} price={}", high.index, high.datetime, high.value);
    }
    if let Some(low) = context.get_last_low_fractal(timeframe, true) {
        println!("SCAN best low: index={} datetime={} price={}", low.index, low.datetime, low.value);
    }

    Ok(())
}
