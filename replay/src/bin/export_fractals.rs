use std::fs;
use std::path::PathBuf;

use fractline::{DataReceiver, FractalContext, ScanConfig, init_logging};
use replay::{FractalRecord, ScanSummary, timeframe_csv_path};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct ExportPayload {
    symbol: String,
    timeframe: String,
    period: usize,
    bars: usize,
    summary: ScanSummary,
    fractals: Vec<FractalRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "usage: cargo run -p replay --bin export_fractals -- <config.yaml|json> <csv_dir> [output_dir]"
        );
        std::process::exit(2);
    }

    init_logging();

    let config = ScanConfig::from_file(&args[1])?;
    let csv_dir = PathBuf::from(&args[2]);
    let output_dir = if args.len() >= 4 {
        PathBuf::from(&args[3])
    } else {
        PathBuf::from(format!("replay/output/{}", config.symbol))
    };
    fs::create_dir_all(&output_dir)?;

    let mut receiver = DataReceiver::new(FractalContext::new(config.symbol.clone()));
    for timeframe in config.timeframe_list()? {
        let csv_path = timeframe_csv_path(&csv_dir, &config.symbol, timeframe);
        if !csv_path.exists() {
            warn!(path = %csv_path.display(), "no bars for timeframe, skipped");
            continue;
        }
        let options = config.profile.resolve_for(timeframe)?;
        receiver.register_csv_history(&csv_path, timeframe, options)?;

        let context = receiver.context();
        let Some(detector) = context.detector(timeframe) else {
            continue;
        };
        let chain = detector.chain();
        let payload = ExportPayload {
            symbol: config.symbol.clone(),
            timeframe: timeframe.as_str().to_string(),
            period: detector.options().period,
            bars: context.count(timeframe),
            summary: ScanSummary::from_chain(chain),
            fractals: FractalRecord::all_from_chain(chain),
        };

        let json_path = output_dir.join(format!("fractal_{}.json", timeframe.as_str()));
        fs::write(&json_path, serde_json::to_string_pretty(&payload)?)?;
        context.write_parquet_snapshot(timeframe, &output_dir)?;
        info!(
            timeframe = timeframe.as_str(),
            fractals = payload.fractals.len(),
            path = %json_path.display(),
            "fractals exported"
        );
    }

    println!("exported {} timeframe(s) to {}", receiver.context().timeframes().len(), output_dir.display());
    Ok(())
}
