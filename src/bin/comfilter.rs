//! Thin CLI shell around the core `encode`/`decode` operations: the shell
//! owns file opening, argument parsing, and diagnostic streams. No
//! argument-parsing crate is used; the surface is two subcommands and two
//! file paths.

use comfilter::{decode, encode, ModemConfig, Wav};
use std::fs::File;
use std::io::{Read, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("comfilter: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    match args.get(1).map(String::as_str) {
        Some("generate") => {
            let input_path = args.get(2).ok_or("usage: comfilter generate <input-bytes> <output-wav>")?;
            let output_path = args.get(3).ok_or("usage: comfilter generate <input-bytes> <output-wav>")?;
            generate(input_path, output_path)
        }
        Some("decode") => {
            let input_path = args.get(2).ok_or("usage: comfilter decode <input-wav> <output-bytes>")?;
            let output_path = args.get(3).ok_or("usage: comfilter decode <input-wav> <output-bytes>")?;
            decode_cmd(input_path, output_path)
        }
        _ => Err("usage: comfilter <generate|decode> <input> <output>".to_string()),
    }
}

fn generate(input_path: &str, output_path: &str) -> Result<(), String> {
    let config = ModemConfig::defaults();
    let mut input_bytes = Vec::new();
    File::open(input_path)
        .and_then(|mut f| f.read_to_end(&mut input_bytes))
        .map_err(|e| format!("reading {input_path}: {e}"))?;

    let samples = encode(&config, &input_bytes).map_err(|e| e.to_string())?;
    let wav = Wav::mono(config.sample_rate, samples);
    let mut output = File::create(output_path).map_err(|e| format!("creating {output_path}: {e}"))?;
    wav.write(&mut output).map_err(|e| e.to_string())
}

fn decode_cmd(input_path: &str, output_path: &str) -> Result<(), String> {
    let config = ModemConfig::defaults();
    let input = File::open(input_path).map_err(|e| format!("reading {input_path}: {e}"))?;
    let wav = Wav::read(input).map_err(|e| e.to_string())?;

    let mut config = config;
    config.sample_rate = wav.sample_rate;
    let (bytes, stats) = decode::<f64>(&config, &wav.samples, None).map_err(|e| e.to_string())?;
    if stats.framing_errors > 0 {
        log::warn!("{} framing error(s) during decode", stats.framing_errors);
    }

    let mut output = File::create(output_path).map_err(|e| format!("creating {output_path}: {e}"))?;
    output.write_all(&bytes).map_err(|e| format!("writing {output_path}: {e}"))
}
