//! Waveform synthesis from a trained acoustic model
//!
//! A [`Synthesizer`] owns its model for its whole lifetime: load once, then
//! call [`Synthesizer::synthesize`] as often as needed. Calls take `&mut self`,
//! so one synthesizer serves one call at a time; share it behind a `Mutex` if
//! several callers need it.

#[cfg(feature = "onnx")]
pub mod onnx_model;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use ndarray::{Array2, ArrayView2};
use crate::audio::{encode_wav, load_wav, SpectrogramExtractor};
use crate::config::{Config, SynthesisConfig};
use crate::error::{VcError, Result};

#[cfg(feature = "onnx")]
pub use onnx_model::OnnxAcousticModel;

/// Maps a time-major mel spectrogram to a time-major normalised linear spectrogram.
pub trait AcousticModel {
    fn predict_linear(&mut self, mel: ArrayView2<f32>) -> Result<Array2<f32>>;
}

/// Supported model architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Tacotron,
}

impl FromStr for ModelKind {
    type Err = VcError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "tacotron" => Ok(Self::Tacotron),
            other => Err(VcError::model(format!("Unknown model: {}", other))),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tacotron => write!(f, "tacotron"),
        }
    }
}

pub struct Synthesizer<M: AcousticModel> {
    model: M,
    extractor: SpectrogramExtractor,
    synthesis: SynthesisConfig,
}

impl<M: AcousticModel> Synthesizer<M> {
    pub fn with_model(model: M, config: &Config) -> Self {
        Self {
            model,
            extractor: SpectrogramExtractor::new(&config.audio),
            synthesis: config.synthesis.clone(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Convert the recording at `input_path` and return it as WAV bytes
    pub fn synthesize<P: AsRef<Path>>(&mut self, input_path: P) -> Result<Vec<u8>> {
        let sample_rate = self.extractor.config().sample_rate;
        let input = load_wav(input_path.as_ref(), sample_rate)?;
        let mel = self.extractor.melspectrogram(&input)?;

        let linear = self.model.predict_linear(mel.view())?;
        log::debug!("Mel {:?} -> linear {:?}", mel.dim(), linear.dim());

        let wav = self.extractor.inv_spectrogram(linear.view(), &self.synthesis)?;
        let wav = self.extractor.inv_preemphasis(&wav);
        let end = self.extractor.find_endpoint(
            &wav,
            self.synthesis.endpoint_threshold_db,
            self.synthesis.endpoint_min_silence_sec,
        );
        log::debug!("Endpoint at {} of {} samples", end, wav.len());

        encode_wav(&wav[..end], sample_rate)
    }
}
