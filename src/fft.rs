/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
use crate::error::{EvalError, Result};
use num_complex::Complex;
use serde::Serialize;
use std::f64::consts::PI;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Window {
    Hamming,
    Hanning,
    Blackman,
    Rectangle,
}

impl Window {
    /// Overlap between consecutive frames for this window type.
    pub fn overlap(&self, frame_size: usize) -> usize {
        match self {
            Window::Hamming | Window::Hanning => frame_size / 2,
            Window::Blackman => (frame_size * 2) / 3,
            Window::Rectangle => 0,
        }
    }

    /// Window coefficients for a frame of the given size.
    pub fn coefficients(&self, frame_size: usize) -> Vec<f64> {
        let denom = (frame_size.max(2) - 1) as f64;
        match self {
            Window::Hamming => (0..frame_size)
                .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f64 / denom).cos())
                .collect(),
            Window::Hanning => (0..frame_size)
                .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / denom).cos())
                .collect(),
            Window::Blackman => (0..frame_size)
                .map(|n| {
                    let ratio = 2.0 * PI * n as f64 / denom;
                    0.42 - 0.50 * ratio.cos() + 0.08 * (2.0 * ratio).cos()
                })
                .collect(),
            Window::Rectangle => vec![1.0; frame_size],
        }
    }
}

impl FromStr for Window {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hamming" => Ok(Window::Hamming),
            "hanning" | "hann" => Ok(Window::Hanning),
            "blackman" => Ok(Window::Blackman),
            "rectangle" | "rect" => Ok(Window::Rectangle),
            other => Err(EvalError::Config(format!("unknown window type '{}'", other))),
        }
    }
}

/// Cooley-Tukey iterative radix-2 FFT, in place. Length must be a power of two.
fn fft_in_place(output: &mut [Complex<f64>]) {
    let n = output.len();
    if n < 2 {
        return;
    }

    // Bit-reverse permutation
    let mut j = 0;
    for i in 1..n - 1 {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            output.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let phase_step = -2.0 * PI / len as f64;
        for start in (0..n).step_by(len) {
            for i in 0..half {
                let w = Complex::from_polar(1.0, phase_step * i as f64);
                let u = output[start + i];
                let v = output[start + i + half] * w;
                output[start + i] = u + v;
                output[start + i + half] = u - v;
            }
        }
        len <<= 1;
    }
}

/// Forward FFT of a complex sequence. Fails with `EvalError::Config` unless the length is a power of two.
pub fn fft(xs: &[Complex<f64>]) -> Result<Vec<Complex<f64>>> {
    if !xs.len().is_power_of_two() {
        return Err(EvalError::Config(format!("FFT length must be a power of two, got {}", xs.len())));
    }
    let mut output = xs.to_vec();
    fft_in_place(&mut output);
    Ok(output)
}

/// Short-time Fourier transform of a real signal.
///
/// Frames advance by `frame_size - window.overlap(frame_size)`; the last partial frame is zero-padded.
///
/// # Arguments
/// * `samples`    - Real time-domain samples.
/// * `frame_size` - Samples per frame, a power of two not smaller than 2.
/// * `window`     - Window function applied to each frame.
///
/// # Returns
/// One full complex spectrum (`frame_size` bins) per frame, or `EvalError::Config` for a bad frame size.
pub fn stft(samples: &[f64], frame_size: usize, window: Window) -> Result<Vec<Vec<Complex<f64>>>> {
    if frame_size < 2 || !frame_size.is_power_of_two() {
        return Err(EvalError::Config(format!("frame size must be a power of two >= 2, got {}", frame_size)));
    }
    let step = frame_size - window.overlap(frame_size);
    let coefficients = window.coefficients(frame_size);

    let mut frames = Vec::new();
    let mut start = 0;
    while start < samples.len() {
        let end = (start + frame_size).min(samples.len());
        let mut frame: Vec<Complex<f64>> = samples[start..end]
            .iter()
            .zip(&coefficients)
            .map(|(&x, &w)| Complex::new(x * w, 0.0))
            .collect();
        frame.resize(frame_size, Complex::new(0.0, 0.0));
        fft_in_place(&mut frame);
        frames.push(frame);
        if end == samples.len() {
            break;
        }
        start += step;
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use crate::_EPSILON;
    use float_cmp::approx_eq;
    use num_complex::Complex;
    use rustfft::FftPlanner;

    #[test]
    fn test_fft_vs_rustfft() {
        let size = 4096;
        let samples: Vec<Complex<f64>> = generate_chord(size, 440.0, 44100.0)
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();

        let mut planner = FftPlanner::<f64>::new();
        let r_fft = planner.plan_fft_forward(size);
        let mut rustfft_result = samples.clone();
        r_fft.process(&mut rustfft_result);

        let my_result = fft(&samples).unwrap();

        let all_close = my_result.iter().zip(rustfft_result).all(|(a, b)| {
            approx_eq!(f64, a.re, b.re, epsilon = 1e-9) && approx_eq!(f64, a.im, b.im, epsilon = 1e-9)
        });
        assert!(all_close);
    }

    #[test]
    fn test_fft_of_impulse_is_flat() {
        let mut xs = vec![Complex::new(0.0, 0.0); 8];
        xs[0] = Complex::new(1.0, 0.0);
        for bin in fft(&xs).unwrap() {
            assert!(approx_eq!(f64, bin.re, 1.0, epsilon = _EPSILON));
            assert!(approx_eq!(f64, bin.im, 0.0, epsilon = _EPSILON));
        }
    }

    #[test]
    fn test_fft_rejects_bad_length() {
        let xs = vec![Complex::new(1.0, 0.0); 12];
        assert!(matches!(fft(&xs), Err(EvalError::Config(_))));
        assert!(matches!(fft(&[]), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_stft_frame_count() {
        let samples = vec![0.5; 10];
        // Hanning 4: hop 2 -> starts 0, 2, 4, 6 (6..10 reaches the end)
        assert_eq!(stft(&samples, 4, Window::Hanning).unwrap().len(), 4);
        // Rectangle 4: hop 4 -> starts 0, 4, 8 (last one zero-padded)
        let frames = stft(&samples, 4, Window::Rectangle).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.len() == 4));
        // padded frame holds two samples of 0.5, so its DC bin is 1.0
        assert!(approx_eq!(f64, frames[2][0].re, 1.0, epsilon = _EPSILON));
    }

    #[test]
    fn test_stft_rejects_bad_frame_size() {
        assert!(matches!(stft(&[0.0; 16], 100, Window::Hanning), Err(EvalError::Config(_))));
        assert!(matches!(stft(&[0.0; 16], 1, Window::Hanning), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_window_from_str() {
        assert_eq!("Hanning".parse::<Window>().unwrap(), Window::Hanning);
        assert_eq!("BLACKMAN".parse::<Window>().unwrap(), Window::Blackman);
        assert!("kaiser".parse::<Window>().is_err());
    }
}
