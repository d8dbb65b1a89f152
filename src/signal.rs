/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
use crate::error::{EvalError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Sample encoding of a decoded PCM buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SampleFormat {
    Int { bits: u16 }, // Signed integer PCM of the given width
    Float,             // Floating point PCM, any range
}

impl SampleFormat {
    /// Largest positive value representable by an integer format.
    fn int_full_scale(bits: u16) -> Result<f64> {
        if bits == 0 || bits > 32 {
            return Err(EvalError::Decode(format!("unsupported integer bit width {}", bits)));
        }
        Ok(((1u64 << (bits - 1)) - 1) as f64)
    }
}

impl FromStr for SampleFormat {
    type Err = EvalError;

    /// Accepts names like `i16`, `s24`, `int32`, `pcm16`, `f32`, `f64`, `float`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        if matches!(s.as_str(), "f32" | "f64" | "float" | "ieee_float") {
            return Ok(SampleFormat::Float);
        }
        let digits = ["int", "pcm", "i", "s"]
            .iter()
            .find_map(|prefix| s.strip_prefix(prefix))
            .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()));
        match digits.and_then(|d| d.parse::<u16>().ok()) {
            Some(bits) => {
                SampleFormat::int_full_scale(bits)?;
                Ok(SampleFormat::Int { bits })
            }
            None => Err(EvalError::Decode(format!("unrecognized sample format '{}'", s))),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleFormat::Int { bits } => write!(f, "i{}", bits),
            SampleFormat::Float => write!(f, "float"),
        }
    }
}

/// Describes an interleaved PCM buffer handed over by a decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PcmFormat {
    pub sample_format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Mono signal with samples nominally in [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Signal {
    /// Wraps already normalized mono samples. Fails on empty input, NaN/inf samples or zero sample rate.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(EvalError::Decode("signal has no samples".into()));
        }
        if sample_rate == 0 {
            return Err(EvalError::Decode("sample rate must be positive".into()));
        }
        if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
            return Err(EvalError::Decode(format!("sample {} is not a finite number", i)));
        }
        Ok(Signal { samples, sample_rate })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Never true for a constructed signal.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Average interleaved channels into a single mono track.
fn downmix(raw: &[f64], channels: usize) -> Vec<f64> {
    if channels == 1 {
        return raw.to_vec();
    }
    raw.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// Peak absolute value of a buffer
pub(crate) fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |max, &s| max.max(s.abs()))
}

/// Turn a decoded PCM buffer into a mono, unit-range signal.
///
/// 1. Validate the buffer against its format descriptor
/// 2. Collapse interleaved channels to mono by averaging each frame
/// 3. Integer PCM: divide by the full-scale value of its bit width (clamped to [-1, 1])
/// 4. Float PCM: divide by the peak absolute value, unless the buffer is pure silence
///
/// # Arguments
/// * `raw`    - Interleaved samples as read from the decoder, integer codes or floats.
/// * `format` - Sample encoding, channel count and sample rate of `raw`.
///
/// # Returns
/// A mono `Signal`, or `EvalError::Decode` for empty or malformed input.
pub fn normalize(raw: &[f64], format: &PcmFormat) -> Result<Signal> {
    if raw.is_empty() {
        return Err(EvalError::Decode("PCM buffer is empty".into()));
    }
    if format.channels == 0 {
        return Err(EvalError::Decode("channel count must be positive".into()));
    }
    if format.sample_rate == 0 {
        return Err(EvalError::Decode("sample rate must be positive".into()));
    }
    let channels = format.channels as usize;
    if raw.len() % channels != 0 {
        return Err(EvalError::Decode(format!(
            "buffer of {} samples is not a whole number of {}-channel frames",
            raw.len(),
            channels
        )));
    }
    if raw.iter().any(|s| !s.is_finite()) {
        return Err(EvalError::Decode("PCM buffer contains non-finite samples".into()));
    }

    let mono = downmix(raw, channels);

    let samples = match format.sample_format {
        SampleFormat::Int { bits } => {
            let full_scale = SampleFormat::int_full_scale(bits)?;
            mono.into_iter().map(|s| (s / full_scale).clamp(-1.0, 1.0)).collect()
        }
        SampleFormat::Float => {
            let max_sample = peak(&mono);
            if max_sample > 0.0 {
                mono.into_iter().map(|s| s / max_sample).collect()
            } else {
                mono
            }
        }
    };

    Signal::new(samples, format.sample_rate)
}
