/* ==========================================================================================
 *                          This file is part of the Bachelor Thesis project
 *                                   University of Wrocław
 *                      Evaluation and Ranking of Noise Reduction Methods
 *                                         June 2025
 * ========================================================================================== */
use crate::error::{EvalError, Result};
use crate::signal::{normalize, PcmFormat, SampleFormat, Signal};
use hound::WavReader;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Decode a WAV container held in memory into interleaved PCM plus its format.
///
/// Integer samples are returned as raw codes (e.g. -32768..=32767 for 16-bit),
/// float samples as stored. Scaling is left to `signal::normalize`.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f64>, PcmFormat)> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| EvalError::Decode(format!("not a readable WAV stream: {}", e)))?;
    let spec = reader.spec();

    let sample_format = match spec.sample_format {
        hound::SampleFormat::Int => SampleFormat::Int { bits: spec.bits_per_sample },
        hound::SampleFormat::Float => SampleFormat::Float,
    };
    let format = PcmFormat { sample_format, channels: spec.channels, sample_rate: spec.sample_rate };

    let samples = match sample_format {
        SampleFormat::Int { .. } => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    log::debug!(
        "decoded WAV: {} samples, {} ch, {} Hz, {}",
        samples.len(),
        format.channels,
        format.sample_rate,
        format.sample_format
    );
    Ok((samples, format))
}

/// Decode and normalize WAV bytes into a mono signal.
pub fn signal_from_bytes(bytes: &[u8]) -> Result<Signal> {
    let (raw, format) = decode_wav(bytes)?;
    normalize(&raw, &format)
}

/// Read a WAV file from disk and return it as a normalized mono signal.
pub fn load_signal<P: AsRef<Path>>(path: P) -> Result<Signal> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    signal_from_bytes(&bytes).map_err(|e| match e {
        EvalError::Decode(msg) => EvalError::Decode(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::_EPSILON;
    use float_cmp::approx_eq;
    use hound::{WavSpec, WavWriter};

    /// Encode integer samples as an in-memory WAV file.
    fn int_wav(samples: &[i32], channels: u16, bits: u16, sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec { channels, sample_rate, bits_per_sample: bits, sample_format: hound::SampleFormat::Int };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    /// Encode float samples as an in-memory 32-bit float WAV file.
    fn float_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec { channels, sample_rate, bits_per_sample: 32, sample_format: hound::SampleFormat::Float };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_int16_mono() {
        let bytes = int_wav(&[0, 32767, -32768, 100], 1, 16, 44100);
        let (raw, format) = decode_wav(&bytes).unwrap();
        assert_eq!(raw, vec![0.0, 32767.0, -32768.0, 100.0]);
        assert_eq!(format.sample_format, SampleFormat::Int { bits: 16 });
        assert_eq!(format.channels, 1);
        assert_eq!(format.sample_rate, 44100);
    }

    #[test]
    fn test_signal_from_int16_stereo() {
        // frames: (32767, 32767), (0, -32767)
        let bytes = int_wav(&[32767, 32767, 0, -32767], 2, 16, 22050);
        let sig = signal_from_bytes(&bytes).unwrap();
        assert_eq!(sig.len(), 2);
        assert_eq!(sig.sample_rate(), 22050);
        assert!(approx_eq!(f64, sig.samples()[0], 1.0, epsilon = _EPSILON));
        assert!(approx_eq!(f64, sig.samples()[1], -0.5, epsilon = _EPSILON));
    }

    #[test]
    fn test_signal_from_float_wav_is_peak_normalized() {
        let bytes = float_wav(&[0.25, -0.5, 0.125], 1, 16000);
        let sig = signal_from_bytes(&bytes).unwrap();
        assert!(approx_eq!(f64, sig.samples()[0], 0.5, epsilon = _EPSILON));
        assert!(approx_eq!(f64, sig.samples()[1], -1.0, epsilon = _EPSILON));
        assert!(approx_eq!(f64, sig.samples()[2], 0.25, epsilon = _EPSILON));
    }

    #[test]
    fn test_empty_wav_is_decode_error() {
        let bytes = int_wav(&[], 1, 16, 44100);
        assert!(matches!(signal_from_bytes(&bytes), Err(EvalError::Decode(_))));
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        assert!(matches!(signal_from_bytes(b"ID3\x04not a wav"), Err(EvalError::Decode(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(load_signal("/nonexistent/definitely/missing.wav"), Err(EvalError::Io(_))));
    }
}
