//! Acoustic model backed by an exported ONNX graph

use std::path::{Path, PathBuf};
use ndarray::{Array2, ArrayView2, Axis, Ix2};
use crate::config::Config;
use crate::error::{VcError, Result};
use crate::onnx::{OnnxSession, SessionConfig};
use super::{AcousticModel, ModelKind, Synthesizer};

/// Graph input `[1, frames, num_mels]`, output `[1, frames, num_freq]` or `[frames, num_freq]`
#[derive(Debug)]
pub struct OnnxAcousticModel {
    kind: ModelKind,
    checkpoint_path: PathBuf,
    session: OnnxSession,
}

impl OnnxAcousticModel {
    pub fn load(checkpoint_path: &Path, kind: ModelKind, inference_threads: usize) -> Result<Self> {
        log::info!("Constructing model: {}", kind);
        log::info!("Loading checkpoint: {}", checkpoint_path.display());

        let session = OnnxSession::new(checkpoint_path, SessionConfig {
            intra_op_num_threads: inference_threads.min(i16::MAX as usize) as i16,
            ..Default::default()
        })?;

        Ok(Self { kind, checkpoint_path: checkpoint_path.to_path_buf(), session })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }
}

impl AcousticModel for OnnxAcousticModel {
    fn predict_linear(&mut self, mel: ArrayView2<f32>) -> Result<Array2<f32>> {
        let input = mel.to_owned().insert_axis(Axis(0));
        let mut output = self.session.run(input)?;

        if output.ndim() == 3 {
            if output.shape()[0] != 1 {
                return Err(VcError::model(format!("Expected batch size 1, got {:?}", output.shape())));
            }
            output = output.index_axis_move(Axis(0), 0);
        }

        output
            .into_dimensionality::<Ix2>()
            .map_err(|e| VcError::model(format!("Unexpected linear output shape: {}", e)))
    }
}

impl Synthesizer<OnnxAcousticModel> {
    /// Build the model named `model_name` and restore `checkpoint_path` into it
    pub fn load<P: AsRef<Path>>(checkpoint_path: P, model_name: &str, config: &Config) -> Result<Self> {
        let kind: ModelKind = model_name.parse()?;
        let model = OnnxAcousticModel::load(checkpoint_path.as_ref(), kind, config.synthesis.inference_threads)?;
        Ok(Self::with_model(model, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_name_fails_before_loading() {
        let Err(err) = Synthesizer::<OnnxAcousticModel>::load("/nonexistent.onnx", "wavenet", &Config::default()) else {
            panic!("unknown model name accepted");
        };
        assert!(err.to_string().contains("Unknown model"));
    }

    #[test]
    fn test_missing_checkpoint() {
        let Err(err) = Synthesizer::<OnnxAcousticModel>::load("/nonexistent.onnx", "tacotron", &Config::default()) else {
            panic!("missing checkpoint accepted");
        };
        assert!(matches!(err, VcError::Model { .. }));
    }
}
