//! ONNX Runtime session wrapper
//!
//! Uses onnxruntime-rs with one process-wide environment so that sessions can
//! be held as `Session<'static>` by their owners.

use std::path::Path;
use ndarray::{Array3, ArrayD};
use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::session::Session;
use onnxruntime::tensor::OrtOwnedTensor;
use onnxruntime::{GraphOptimizationLevel, LoggingLevel};
use crate::error::{VcError, Result};

static ENVIRONMENT: OnceCell<Environment> = OnceCell::new();

fn environment() -> Result<&'static Environment> {
    ENVIRONMENT
        .get_or_try_init(|| {
            Environment::builder()
                .with_name("vcprep")
                .with_log_level(LoggingLevel::Warning)
                .build()
        })
        .map_err(|e| VcError::model(format!("Failed to create ONNX environment: {}", e)))
}

/// Session configuration
#[derive(Debug)]
pub struct SessionConfig {
    pub optimization_level: GraphOptimizationLevel,
    pub intra_op_num_threads: i16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            optimization_level: GraphOptimizationLevel::All,
            intra_op_num_threads: 4,
        }
    }
}

/// ONNX inference session over a single f32 input
pub struct OnnxSession {
    session: Session<'static>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl std::fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSession")
            .field("input_names", &self.input_names)
            .field("output_names", &self.output_names)
            .finish()
    }
}

impl OnnxSession {
    pub fn new(model_path: &Path, config: SessionConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(VcError::model(format!(
                "ONNX model file does not exist: {}", model_path.display()
            )));
        }

        let session = environment()?
            .new_session_builder()?
            .with_optimization_level(config.optimization_level)?
            .with_number_threads(config.intra_op_num_threads)?
            .with_model_from_file(model_path.to_path_buf())?;

        let input_names: Vec<String> = session.inputs.iter().map(|input| input.name.clone()).collect();
        let output_names: Vec<String> = session.outputs.iter().map(|output| output.name.clone()).collect();

        if input_names.len() != 1 {
            return Err(VcError::model(format!(
                "Expected a graph with one input, found {:?}", input_names
            )));
        }
        if output_names.is_empty() {
            return Err(VcError::model("Graph has no outputs"));
        }

        log::info!("ONNX model loaded successfully");
        log::debug!("Input info: {:?}", input_names);
        log::debug!("Output info: {:?}", output_names);

        Ok(Self { session, input_names, output_names })
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Run the graph and copy out its first output
    pub fn run(&mut self, input: Array3<f32>) -> Result<ArrayD<f32>> {
        log::debug!("Input shape: {:?}", input.shape());

        let outputs: Vec<OrtOwnedTensor<f32, _>> = self.session.run(vec![input])?;
        let first = outputs
            .first()
            .ok_or_else(|| VcError::model("ONNX inference returned no outputs"))?;

        log::debug!("Output shape: {:?}", first.shape());
        Ok((**first).to_owned())
    }
}
