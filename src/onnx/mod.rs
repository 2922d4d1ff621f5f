//! ONNX Runtime bindings

pub mod session;

pub use session::{OnnxSession, SessionConfig};
