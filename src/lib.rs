//! vcprep - Voice Conversion Corpus Preprocessing
//!
//! Turns paired source/target recordings into spectrogram training data and
//! synthesizes waveforms through a trained acoustic model.

pub mod audio;
pub mod config;
pub mod error;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod processing;
pub mod synthesis;

pub use config::{Config, Args, Command};
pub use error::{VcError, Result};
pub use processing::{preprocess, IndexSummary, PreprocessResult};
pub use synthesis::{AcousticModel, Synthesizer};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init()
        .ok();
}

pub fn get_library_info() -> LibraryInfo {
    LibraryInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl std::fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} - {}", self.name, self.version, self.description)
    }
}
