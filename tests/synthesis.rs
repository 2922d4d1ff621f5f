//! Synthesis with an in-process acoustic model

mod common;

use std::io::Cursor;
use ndarray::{Array2, ArrayView2, Axis};
use tempfile::TempDir;
use vcprep::config::Config;
use vcprep::synthesis::{AcousticModel, Synthesizer};
use vcprep::Result;

/// Spreads each mel frame across the linear bins by nearest-band lookup
struct StretchModel {
    num_freq: usize,
    calls: usize,
}

impl AcousticModel for StretchModel {
    fn predict_linear(&mut self, mel: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.calls += 1;
        let num_mels = mel.ncols();
        let mut linear = Array2::zeros((mel.nrows(), self.num_freq));
        for (mut out_row, mel_row) in linear.axis_iter_mut(Axis(0)).zip(mel.axis_iter(Axis(0))) {
            for (k, value) in out_row.iter_mut().enumerate() {
                *value = mel_row[k * num_mels / self.num_freq];
            }
        }
        Ok(linear)
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.synthesis.griffin_lim_iters = 5;
    config
}

#[test]
fn test_synthesize_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.wav");
    common::write_tone(&input, 440.0, 8000);

    let config = fast_config();
    let model = StretchModel { num_freq: config.audio.num_freq, calls: 0 };
    let mut synthesizer = Synthesizer::with_model(model, &config);

    let first = synthesizer.synthesize(&input).unwrap();
    let second = synthesizer.synthesize(&input).unwrap();

    assert_eq!(first, second);
    assert_eq!(synthesizer.model().calls, 2);
}

#[test]
fn test_synthesized_wav_format() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.wav");
    common::write_tone(&input, 300.0, 6000);

    let config = fast_config();
    let model = StretchModel { num_freq: config.audio.num_freq, calls: 0 };
    let bytes = Synthesizer::with_model(model, &config).synthesize(&input).unwrap();

    let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 20000);
    assert_eq!(spec.bits_per_sample, 16);
    // 25 frames -> 24 hops of 250 samples, no trailing silence window fits
    assert_eq!(reader.len(), 6000);
}

#[test]
fn test_missing_input_fails() {
    let config = fast_config();
    let model = StretchModel { num_freq: config.audio.num_freq, calls: 0 };
    let mut synthesizer = Synthesizer::with_model(model, &config);
    assert!(synthesizer.synthesize("/nonexistent/input.wav").is_err());
    assert_eq!(synthesizer.model().calls, 0);
}
