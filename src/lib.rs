/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
pub mod config;
pub mod error;
pub mod fft;
pub mod metrics;
pub mod ranking;
pub mod report;
pub mod signal;
pub mod spectrogram;
pub mod wav;

#[cfg(test)]
mod testutil;

pub use error::{EvalError, Result};
pub use metrics::{compare, MetricVector};
pub use ranking::{rank, CandidateTable, NormalizedTable, RankedCandidate, RankingResult, Weights};
pub use signal::{normalize, PcmFormat, SampleFormat, Signal};

#[cfg(test)]
const _EPSILON: f64 = 1e-12;
