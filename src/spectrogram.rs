/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
//! Plot-ready arrays derived from a signal: magnitude spectrogram and waveform envelope.
use crate::error::{EvalError, Result};
use crate::fft::{stft, Window};
use crate::signal::Signal;
use serde::Serialize;

/// Magnitude floor before taking the logarithm
const MAGNITUDE_FLOOR: f64 = 1e-10;

/// Short-time magnitude spectrum in dB, one row per frame.
#[derive(Clone, Debug, Serialize)]
pub struct Spectrogram {
    /// `frames[t][k]`, k in 0..=frame_size/2
    pub frames: Vec<Vec<f64>>,
    /// Center frequency of each bin in Hz
    pub frequencies: Vec<f64>,
    /// Start time of each frame in seconds
    pub times: Vec<f64>,
    pub frame_size: usize,
    pub window: Window,
}

/// Compute a dB magnitude spectrogram: 20 * log10(|X| + 1e-10) for the non-negative frequency bins.
pub fn spectrogram(signal: &Signal, frame_size: usize, window: Window) -> Result<Spectrogram> {
    let spectra = stft(signal.samples(), frame_size, window)?;
    let bins = frame_size / 2 + 1;
    let sr = signal.sample_rate() as f64;
    let hop = frame_size - window.overlap(frame_size);

    let frames: Vec<Vec<f64>> = spectra
        .iter()
        .map(|frame| frame[..bins].iter().map(|c| 20.0 * (c.norm() + MAGNITUDE_FLOOR).log10()).collect())
        .collect();
    let frequencies = (0..bins).map(|k| k as f64 * sr / frame_size as f64).collect();
    let times = (0..frames.len()).map(|t| (t * hop) as f64 / sr).collect();

    Ok(Spectrogram { frames, frequencies, times, frame_size, window })
}

/// Min/max pair of one envelope bucket
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Peak {
    pub min: f64,
    pub max: f64,
}

/// Reduce a signal to `buckets` min/max pairs for drawing its waveform.
///
/// Fewer samples than buckets yields one bucket per sample.
pub fn waveform_envelope(signal: &Signal, buckets: usize) -> Result<Vec<Peak>> {
    if buckets == 0 {
        return Err(EvalError::Config("envelope needs at least one bucket".into()));
    }
    let samples = signal.samples();
    let chunk = samples.len().div_ceil(buckets);
    Ok(samples
        .chunks(chunk)
        .map(|c| Peak {
            min: c.iter().copied().fold(f64::INFINITY, f64::min),
            max: c.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use crate::_EPSILON;
    use float_cmp::approx_eq;

    #[test]
    fn test_spectrogram_peak_bin() {
        // 1 kHz at 8 kHz sample rate, 256-point frames -> bin 32
        let sig = Signal::new(generate_sinusoidal(4096, 1000.0, 8000.0), 8000).unwrap();
        let spec = spectrogram(&sig, 256, Window::Hanning).unwrap();
        assert_eq!(spec.frequencies.len(), 129);
        assert_eq!(spec.frames.len(), spec.times.len());
        assert!(approx_eq!(f64, spec.frequencies[32], 1000.0, epsilon = _EPSILON));
        assert!(approx_eq!(f64, spec.times[1], 128.0 / 8000.0, epsilon = _EPSILON));
        let frame = &spec.frames[3];
        let loudest = frame.iter().enumerate().max_by(|a, b| a.1.total_cmp(b.1)).map(|(k, _)| k).unwrap();
        assert_eq!(loudest, 32);
    }

    #[test]
    fn test_spectrogram_of_silence_is_floored() {
        let sig = Signal::new(vec![0.0; 64], 8000).unwrap();
        let spec = spectrogram(&sig, 16, Window::Rectangle).unwrap();
        assert!(spec.frames.iter().flatten().all(|&db| approx_eq!(f64, db, -200.0, epsilon = 1e-6)));
    }

    #[test]
    fn test_envelope() {
        let sig = Signal::new(vec![0.1, -0.4, 0.9, 0.2, -1.0, 0.3, 0.0], 8000).unwrap();
        let env = waveform_envelope(&sig, 3).unwrap();
        assert_eq!(
            env,
            vec![Peak { min: -0.4, max: 0.9 }, Peak { min: -1.0, max: 0.3 }, Peak { min: 0.0, max: 0.0 }]
        );
        assert_eq!(waveform_envelope(&sig, 100).unwrap().len(), 7);
        assert!(waveform_envelope(&sig, 0).is_err());
    }
}
