//! Error types

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum VcError {
    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    /// Source/target listings do not line up; raised before any work is dispatched.
    #[error("Pairing error: {message}")]
    Pairing { message: String },

    #[error("Feature error: {message}")]
    Feature { message: String },

    #[error("Model error: {message}")]
    Model { message: String },

    /// A single utterance failed inside the worker pool.
    #[error("Processing error (pair {index}): {message}")]
    Processing { index: usize, message: String },
}

impl VcError {
    pub fn audio<S: Into<String>>(msg: S) -> Self { Self::Audio { message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { Self::Config { message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { Self::Io { message: msg.into() } }
    pub fn pairing<S: Into<String>>(msg: S) -> Self { Self::Pairing { message: msg.into() } }
    pub fn feature<S: Into<String>>(msg: S) -> Self { Self::Feature { message: msg.into() } }
    pub fn model<S: Into<String>>(msg: S) -> Self { Self::Model { message: msg.into() } }

    pub fn processing<S: Into<String>>(index: usize, msg: S) -> Self {
        Self::Processing { index, message: msg.into() }
    }
}

pub type Result<T> = std::result::Result<T, VcError>;

impl From<std::io::Error> for VcError {
    fn from(err: std::io::Error) -> Self { Self::io(err.to_string()) }
}

impl From<hound::Error> for VcError {
    fn from(err: hound::Error) -> Self { Self::audio(format!("WAV: {}", err)) }
}

impl From<ndarray_npy::WriteNpyError> for VcError {
    fn from(err: ndarray_npy::WriteNpyError) -> Self { Self::io(format!("npy write: {}", err)) }
}

impl From<ndarray_npy::ReadNpyError> for VcError {
    fn from(err: ndarray_npy::ReadNpyError) -> Self { Self::io(format!("npy read: {}", err)) }
}

impl From<toml::de::Error> for VcError {
    fn from(err: toml::de::Error) -> Self { Self::config(format!("Failed to parse config file: {}", err)) }
}

#[cfg(feature = "onnx")]
impl From<onnxruntime::OrtError> for VcError {
    fn from(err: onnxruntime::OrtError) -> Self { Self::model(format!("ORT: {}", err)) }
}
