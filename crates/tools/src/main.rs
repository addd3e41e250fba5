use std::env;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use flow::FlowConfig;
use foundation::{GeoPoint, PixelSize};
use tools::{SimulateOptions, simulate};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "simulate" => cmd_simulate(args),
        "config" => cmd_config(args),
        _ => Err(usage()),
    }
}

fn cmd_config(args: Vec<String>) -> Result<(), String> {
    // windtrail config
    if !args.is_empty() {
        return Err(usage());
    }
    let text = FlowConfig::default()
        .to_json_pretty()
        .map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn cmd_simulate(args: Vec<String>) -> Result<(), String> {
    let mut opts = SimulateOptions::default();
    let mut seed: Option<u64> = None;
    let mut config_path: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--ticks" => {
                opts.ticks = parse_u64(flag, next_value(&args, &mut i, flag)?)?;
            }
            "--seed" => {
                seed = Some(parse_u64(flag, next_value(&args, &mut i, flag)?)?);
            }
            "--size" => {
                opts.size = parse_size(flag, next_value(&args, &mut i, flag)?)?;
            }
            "--center" => {
                let v = next_value(&args, &mut i, flag)?;
                let (lat, lon) = parse_pair(flag, v)?;
                opts.center = GeoPoint::new(lat, lon);
            }
            "--zoom" => {
                let v = next_value(&args, &mut i, flag)?;
                opts.zoom = v
                    .parse::<f64>()
                    .map_err(|e| format!("{flag}: invalid zoom {v:?}: {e}"))?;
            }
            "--pan-every" => {
                let n = parse_u64(flag, next_value(&args, &mut i, flag)?)?;
                let (dx, dy) = parse_pair(flag, next_value(&args, &mut i, flag)?)?;
                opts.pan_every = Some((n, dx, dy));
            }
            "--resize-at" => {
                let n = parse_u64(flag, next_value(&args, &mut i, flag)?)?;
                let size = parse_size(flag, next_value(&args, &mut i, flag)?)?;
                opts.resize_at = Some((n, size));
            }
            "--config" => {
                config_path = Some(next_value(&args, &mut i, flag)?.to_string());
            }
            s => {
                return Err(format!("unknown arg: {s}\n\n{}", usage()));
            }
        }
        i += 1;
    }

    if let Some(path) = config_path {
        let text = fs::read_to_string(&path).map_err(|e| format!("read {path:?}: {e}"))?;
        opts.config = FlowConfig::from_json_str(&text).map_err(|e| format!("{path}: {e}"))?;
    }
    // Precedence: --seed, then the config file, then the wall clock.
    opts.config.seed = seed.or(opts.config.seed).or_else(|| Some(clock_seed()));

    let report = simulate(&opts).map_err(|e| e.to_string())?;
    let payload = serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_u64(flag: &str, v: &str) -> Result<u64, String> {
    v.parse::<u64>()
        .map_err(|e| format!("{flag}: invalid integer {v:?}: {e}"))
}

fn parse_size(flag: &str, v: &str) -> Result<PixelSize, String> {
    PixelSize::parse(v).ok_or_else(|| format!("{flag}: expected WIDTHxHEIGHT, got {v:?}"))
}

fn parse_pair(flag: &str, v: &str) -> Result<(f64, f64), String> {
    let (a, b) = v
        .split_once(',')
        .ok_or_else(|| format!("{flag}: expected A,B, got {v:?}"))?;
    let a = a
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("{flag}: {a:?}: {e}"))?;
    let b = b
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("{flag}: {b:?}: {e}"))?;
    Ok((a, b))
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn usage() -> String {
    let exe = env::args()
        .next()
        .unwrap_or_else(|| "windtrail".to_string());
    format!(
        "Usage:\n  {exe} simulate [--ticks N] [--seed S] [--size WxH] [--center LAT,LON] [--zoom Z]\n      [--pan-every N DX,DY] [--resize-at N WxH] [--config FILE]\n  {exe} config\n\nNotes:\n- Runs the wind overlay headless against a Web Mercator map and prints a JSON summary.\n- `config` prints the default overlay configuration; edit it and pass it back with --config.\n- Set RUST_LOG=debug to trace resizes and skipped frames on stderr.\n"
    )
}
