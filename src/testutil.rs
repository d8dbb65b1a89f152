/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
//! Synthetic fixtures shared by the unit tests.
use rand::{distributions::Uniform, thread_rng, Rng};
use std::f64::consts::PI;

/// Uniform white noise in [-1, 1)
pub fn generate_white_noise(len: usize) -> Vec<f64> {
    let mut rng = thread_rng();
    let uniform = Uniform::from(-1.0..1.0);
    (0..len).map(|_| rng.sample(uniform)).collect()
}

/// Sine wave at the given frequency
pub fn generate_sinusoidal(len: usize, frequency: f64, sr: f64) -> Vec<f64> {
    (0..len).map(|i| (2.0 * PI * frequency * i as f64 / sr).sin()).collect()
}

/// Major triad on `root_freq`, scaled back into [-1, 1]
pub fn generate_chord(len: usize, root_freq: f64, sr: f64) -> Vec<f64> {
    let semitone = 2f64.powf(1.0 / 12.0);
    let freqs = [root_freq, root_freq * semitone.powi(4), root_freq * semitone.powi(7)];
    (0..len)
        .map(|i| {
            let t = i as f64 / sr;
            freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum::<f64>() / 3.0
        })
        .collect()
}
