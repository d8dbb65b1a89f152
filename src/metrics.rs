/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                           Evaluation and Ranking of Candidate Outputs
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use crate::error::{EvalError, Result};
use crate::signal::Signal;
use serde::Serialize;

/// Guards divisions by an error or range that may be exactly zero.
pub const EPSILON: f64 = 1e-9;

/// Variance floor used by the self-SNR estimate.
const SELF_SNR_EPSILON: f64 = 1e-8;

/// Comparison metrics of one candidate against the shared reference.
///
/// `pesq_proxy` and `stoi_proxy` are linear stand-ins driven by `correlation` only,
/// not the standardized perceptual measures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricVector {
    pub snr_db: f64,
    pub mse: f64,
    pub correlation: f64,
    pub pesq_proxy: f64,
    pub stoi_proxy: f64,
}

/// Computes the mean squared error (MSE) between two equally long signals.
pub fn mean_square_error(signal1: &[f64], signal2: &[f64]) -> f64 {
    signal1
        .iter()
        .zip(signal2.iter())
        .map(|(s1, s2)| (s1 - s2) * (s1 - s2))
        .sum::<f64>()
        / signal1.len() as f64
}

/// Mean power of a signal
fn mean_power(signal: &[f64]) -> f64 {
    signal.iter().map(|&x| x * x).sum::<f64>() / signal.len() as f64
}

/// Compute the SNR estimate in decibels: 10 * log10(P_reference / (MSE + EPSILON)).
///
/// Only a reference of exactly zero power is replaced by `EPSILON`, so the result stays finite.
pub fn snr_db(reference: &[f64], mse: f64) -> f64 {
    let pow_signal = match mean_power(reference) {
        p if p > 0.0 => p,
        _ => EPSILON,
    };
    10.0 * (pow_signal / (mse + EPSILON)).log10()
}

/// Pearson correlation coefficient of two equally long signals.
///
/// Returns 0 when either side has zero variance.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a > 0.0 && var_b > 0.0 {
        (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// PESQ-like score on the 1.0 ..= 4.5 scale
pub fn pesq_proxy(correlation: f64) -> f64 {
    (1.5 + 3.0 * correlation).clamp(1.0, 4.5)
}

/// STOI-like score on the 0.0 ..= 1.0 scale
pub fn stoi_proxy(correlation: f64) -> f64 {
    (0.6 + 0.4 * correlation).clamp(0.0, 1.0)
}

/// Compare a candidate signal against the reference.
///
/// If the signals have different lengths, both are cut to the length of the shorter one.
/// There is no resampling and no time alignment; a sample-rate mismatch is only logged.
///
/// # Arguments
/// * `reference` - The shared reference (the noisy input).
/// * `candidate` - Output of one method to be scored against the reference.
///
/// # Returns
/// * `MetricVector`, or `EvalError::Length` if either signal holds no samples.
pub fn compare(reference: &Signal, candidate: &Signal) -> Result<MetricVector> {
    let len = reference.len().min(candidate.len());
    if len == 0 {
        return Err(EvalError::Length(format!(
            "cannot compare signals of {} and {} samples",
            reference.len(),
            candidate.len()
        )));
    }
    if reference.sample_rate() != candidate.sample_rate() {
        log::warn!(
            "comparing signals with different sample rates: {} Hz vs {} Hz",
            reference.sample_rate(),
            candidate.sample_rate()
        );
    }
    if reference.len() != candidate.len() {
        log::debug!("truncating {} / {} samples to {}", reference.len(), candidate.len(), len);
    }

    let reference = &reference.samples()[..len];
    let candidate = &candidate.samples()[..len];

    let mse = mean_square_error(reference, candidate);
    let correlation = pearson_correlation(reference, candidate);

    Ok(MetricVector {
        snr_db: snr_db(reference, mse),
        mse,
        correlation,
        pesq_proxy: pesq_proxy(correlation),
        stoi_proxy: stoi_proxy(correlation),
    })
}

/// Power-to-variance ratio of a single signal: mean(x^2) / (var(x) + 1e-8).
fn self_snr(signal: &[f64]) -> f64 {
    let n = signal.len() as f64;
    let mean = signal.iter().sum::<f64>() / n;
    let variance = signal.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    mean_power(signal) / (variance + SELF_SNR_EPSILON)
}

/// Estimated improvement in dB of a cleaned signal over its noisy source,
/// 10 * log10(self_snr(clean) / self_snr(noisy)), without a clean reference.
///
/// Both ratios are floored at 1e-12 so silent inputs give a finite answer.
pub fn improvement_db(noisy: &Signal, clean: &Signal) -> f64 {
    const FLOOR: f64 = 1e-12;
    let snr_noisy = self_snr(noisy.samples()).max(FLOOR);
    let snr_clean = self_snr(clean.samples()).max(FLOOR);
    10.0 * (snr_clean / snr_noisy).log10()
}
