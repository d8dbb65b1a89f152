/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                           Evaluation and Ranking of Candidate Outputs
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use denoise_eval::metrics::compare;
use denoise_eval::ranking::{rank, CandidateTable, Weights};
use denoise_eval::report::{write_csv_header, write_csv_rows};
use denoise_eval::signal::Signal;
use denoise_eval::wav::load_signal;
use denoise_eval::{EvalError, Result};

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;

const REFERENCE_PREFIX: &str = "noisy";

/// WAV files directly inside `dir`, sorted by name
fn wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("wav"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn stem(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string()
}

fn is_reference(path: &Path) -> bool {
    stem(path).to_lowercase().starts_with(REFERENCE_PREFIX)
}

/// Split a case directory into its reference (first `noisy*.wav`) and candidate files.
/// Further `noisy*.wav` files are neither reference nor candidate and are skipped.
fn load_case(case_dir: &Path) -> Result<(Signal, Vec<(String, Signal)>)> {
    let files = wav_files(case_dir)?;
    let (references, candidate_paths): (Vec<PathBuf>, Vec<PathBuf>) = files.into_iter().partition(|p| is_reference(p));
    let reference_path = references
        .first()
        .ok_or_else(|| EvalError::Config(format!("no '{}*.wav' file in {}", REFERENCE_PREFIX, case_dir.display())))?;
    for extra in &references[1..] {
        log::warn!("{}: ignoring extra reference {}", case_dir.display(), extra.display());
    }
    let reference = load_signal(reference_path)?;

    let candidates = candidate_paths
        .iter()
        .map(|p| -> Result<(String, Signal)> { Ok((stem(p), load_signal(p)?)) })
        .collect::<Result<Vec<_>>>()?;
    Ok((reference, candidates))
}

/// Compare and rank one case, appending its rows to the CSV
fn process_case(
    case_name: &str,
    case_dir: &Path,
    weights: &Weights,
    csv_writer: &mut Writer<fs::File>,
) -> Result<()> {
    let (reference, candidates) = load_case(case_dir)?;

    let mut table = CandidateTable::new();
    for (name, candidate) in &candidates {
        table.insert(name.as_str(), compare(&reference, candidate)?)?;
    }
    let result = rank(&table, weights)?;
    write_csv_rows(csv_writer, Some(case_name), &table, &result)?;

    println!("{}: winner {} ({} candidates)", case_name, result.winner().name, table.len());
    Ok(())
}

/// Run every case subdirectory of `test_dir` and write all rankings into one CSV.
///
/// A case that fails (no reference, no candidates, unreadable WAV) is reported and skipped.
///
/// # Returns
/// Number of cases ranked successfully.
pub fn run(test_dir: &Path, out_path: &Path, weights: &Weights) -> Result<usize> {
    weights.validate()?;

    let mut cases: Vec<PathBuf> = fs::read_dir(test_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    cases.sort();
    if cases.is_empty() {
        return Err(EvalError::EmptyInput(format!("no case directories in {}", test_dir.display())));
    }

    let mut csv_writer = Writer::from_path(out_path)?;
    write_csv_header(&mut csv_writer, true)?;

    let mut ranked = 0;
    for case_dir in &cases {
        let case_name = case_dir.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        log::info!("Running case {}", case_name);
        match process_case(&case_name, case_dir, weights, &mut csv_writer) {
            Ok(()) => ranked += 1,
            Err(e) => log::warn!("skipping case {}: {}", case_name, e),
        }
    }

    csv_writer.flush()?;
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_run_ranks_cases() {
        let root = std::env::temp_dir().join(format!("denoise_eval_batch_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let good = root.join("case_a");
        let broken = root.join("case_b");
        fs::create_dir_all(&good).unwrap();
        fs::create_dir_all(&broken).unwrap();

        let reference: Vec<i16> = [16000, 0, -16000, 0].repeat(100);
        write_wav(&good.join("noisy.wav"), &reference);
        write_wav(&good.join("copy.wav"), &reference);
        write_wav(&good.join("silence.wav"), &[0; 400]);
        // no reference in this one
        write_wav(&broken.join("other.wav"), &reference);

        let out = root.join("results.csv");
        let ranked = run(&root, &out, &Weights::default()).unwrap();
        assert_eq!(ranked, 1);

        let text = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("case,rank,method,score"));
        assert!(lines[1].starts_with("case_a,1,copy,"));
        assert!(lines[2].starts_with("case_a,2,silence,"));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_extra_noisy_files_are_not_candidates() {
        let case = std::env::temp_dir().join(format!("denoise_eval_refs_{}", std::process::id()));
        let _ = fs::remove_dir_all(&case);
        fs::create_dir_all(&case).unwrap();

        let reference: Vec<i16> = [16000, 0, -16000, 0].repeat(100);
        write_wav(&case.join("noisy_1.wav"), &reference);
        write_wav(&case.join("noisy_2.wav"), &[0; 400]);
        write_wav(&case.join("wiener.wav"), &reference);

        let (signal, candidates) = load_case(&case).unwrap();
        // noisy_1 sorts first; noisy_2 is silent
        assert!(signal.samples()[0] > 0.4);
        let names: Vec<&str> = candidates.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["wiener"]);

        fs::remove_dir_all(&case).unwrap();
    }
}
