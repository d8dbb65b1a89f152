/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
use clap::{arg, ArgAction, Command};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use denoise_eval::config::EvalConfig;
use denoise_eval::fft::Window;
use denoise_eval::metrics::{compare, improvement_db};
use denoise_eval::ranking::{rank, CandidateTable};
use denoise_eval::report::{ranking_csv, ranking_json, ranking_table};
use denoise_eval::spectrogram::spectrogram;
use denoise_eval::wav::load_signal;
use denoise_eval::{EvalError, Result};

mod batch;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("Denoising Evaluation CLI")
        .version("1.0")
        .about("Compare denoised audio candidates against a noisy reference and rank them")
        .subcommand_required(true)
        .subcommand(
            Command::new("compare")
                .about("Score candidate WAVs against a reference WAV and rank them")
                .arg(arg!(-r --"reference" <FILE> "Reference (noisy) WAV").required(true))
                .arg(
                    arg!(-c --"candidate" <SPEC> "Candidate as NAME=FILE or FILE, repeatable")
                        .required(true)
                        .action(ArgAction::Append),
                )
                .arg(arg!(-C --"config" <FILE> "JSON config with weights and pairings"))
                .arg(arg!(-o --"out-csv" <FILE> "Write ranking CSV"))
                .arg(arg!(-j --"out-json" <FILE> "Write ranking JSON")),
        )
        .subcommand(
            Command::new("lookup")
                .about("Find the pre-recorded clean file for a noisy upload and compare the pair")
                .arg(arg!(-i --"input" <FILE> "Noisy WAV").required(true))
                .arg(arg!(-C --"config" <FILE> "JSON config with weights and pairings")),
        )
        .subcommand(
            Command::new("batch")
                .about("Compare and rank every case directory under DIR")
                .arg(arg!(-d --"dir" <DIR> "Directory of case subdirectories").required(true))
                .arg(arg!(-C --"config" <FILE> "JSON config with weights"))
                .arg(arg!(-o --"out-file" <FILE> "Results CSV").default_value("results.csv")),
        )
        .subcommand(
            Command::new("spectrogram")
                .about("Write the dB magnitude spectrogram of a WAV as CSV")
                .arg(arg!(-i --"input" <FILE> "Input WAV").required(true))
                .arg(arg!(-f --"frame-size" <M> "Frame size").default_value("1024"))
                .arg(arg!(-w --"window" <W> "Hamming|Hanning|Blackman|Rectangle").default_value("Hanning"))
                .arg(arg!(-o --"out-file" <FILE> "Output CSV path").default_value("spectrogram.csv")),
        )
        .get_matches();

    let outcome = match matches.subcommand() {
        Some(("compare", m)) => handle_compare(m),
        Some(("lookup", m)) => handle_lookup(m),
        Some(("batch", m)) => handle_batch(m),
        Some(("spectrogram", m)) => handle_spectrogram(m),
        _ => Err(EvalError::Config("unknown command, use --help".into())),
    };

    if let Err(e) = outcome {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn config_arg(m: &clap::ArgMatches) -> Result<EvalConfig> {
    EvalConfig::load_or_default(m.get_one::<String>("config").map(Path::new))
}

fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    m.get_one::<String>(name)
        .ok_or_else(|| EvalError::Config(format!("missing --{}", name)))
}

/// Split `NAME=FILE`; a bare `FILE` is named after its stem.
fn parse_candidate(spec: &str) -> (String, PathBuf) {
    match spec.split_once('=') {
        Some((name, file)) if !name.is_empty() => (name.to_string(), PathBuf::from(file)),
        _ => {
            let path = PathBuf::from(spec);
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(spec)
                .to_string();
            (name, path)
        }
    }
}

fn handle_compare(m: &clap::ArgMatches) -> Result<()> {
    let config = config_arg(m)?;
    let reference = load_signal(required(m, "reference")?)?;

    let mut table = CandidateTable::new();
    for spec in m.get_many::<String>("candidate").into_iter().flatten() {
        let (name, path) = parse_candidate(spec);
        let candidate = load_signal(&path)?;
        let metrics = compare(&reference, &candidate)?;
        log::debug!("{}: {:?}", name, metrics);
        table.insert(name, metrics)?;
    }

    let result = rank(&table, &config.weights)?;
    print!("{}", ranking_table(&table, &result));

    if let Some(out) = m.get_one::<String>("out-csv") {
        fs::write(out, ranking_csv(&table, &result)?)?;
        println!("Ranking CSV -> {}", out);
    }
    if let Some(out) = m.get_one::<String>("out-json") {
        fs::write(out, ranking_json(&result)?)?;
        println!("Ranking JSON -> {}", out);
    }
    Ok(())
}

fn handle_lookup(m: &clap::ArgMatches) -> Result<()> {
    let config = config_arg(m)?;
    let noisy_path = PathBuf::from(required(m, "input")?);
    let noisy = load_signal(&noisy_path)?;
    println!(
        "Loaded {} ({} samples, {} Hz, {:.2} s)",
        noisy_path.display(),
        noisy.len(),
        noisy.sample_rate(),
        noisy.duration_secs()
    );

    let clean_path = config.pairings.resolve(&noisy_path, &config.assets_dir).ok_or_else(|| {
        EvalError::Config(format!(
            "no clean counterpart registered for '{}'; expected one of the configured names",
            noisy_path.display()
        ))
    })?;
    if !clean_path.exists() {
        return Err(EvalError::Config(format!("clean file '{}' not found", clean_path.display())));
    }

    let clean = load_signal(&clean_path)?;
    let metrics = compare(&noisy, &clean)?;
    println!("Clean counterpart: {}", clean_path.display());
    println!("Estimated improvement: SNR {:.2} dB", improvement_db(&noisy, &clean));
    println!(
        "snr_db={:.2} mse={:.3e} correlation={:.4} pesq_proxy={:.2} stoi_proxy={:.2}",
        metrics.snr_db, metrics.mse, metrics.correlation, metrics.pesq_proxy, metrics.stoi_proxy
    );
    Ok(())
}

fn handle_batch(m: &clap::ArgMatches) -> Result<()> {
    let config = config_arg(m)?;
    let dir = Path::new(required(m, "dir")?);
    let out = Path::new(required(m, "out-file")?);
    let cases = batch::run(dir, out, &config.weights)?;
    println!("Ranked {} cases -> {}", cases, out.display());
    Ok(())
}

fn handle_spectrogram(m: &clap::ArgMatches) -> Result<()> {
    let input = required(m, "input")?;
    let frame_size: usize = required(m, "frame-size")?
        .parse()
        .map_err(|e| EvalError::Config(format!("invalid frame size: {}", e)))?;
    let window: Window = required(m, "window")?.parse()?;
    let out_path = required(m, "out-file")?;

    let signal = load_signal(input)?;
    let spec = spectrogram(&signal, frame_size, window)?;

    let mut csv_writer = csv::Writer::from_path(out_path)?;
    let mut header = vec!["time_s".to_string()];
    header.extend(spec.frequencies.iter().map(|f| format!("{:.1}", f)));
    csv_writer.write_record(&header)?;
    for (t, row) in spec.times.iter().zip(&spec.frames) {
        let mut record = vec![t.to_string()];
        record.extend(row.iter().map(|db| format!("{:.2}", db)));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    println!("Spectrogram ({} frames x {} bins) -> {}", spec.frames.len(), spec.frequencies.len(), out_path);
    Ok(())
}
