//! Configuration management for preprocessing and synthesis

use crate::error::{VcError, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub preprocess: PreprocessConfig,
    pub synthesis: SynthesisConfig,
}

/// Signal parameters shared by feature extraction and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub num_mels: usize,
    pub num_freq: usize,
    pub sample_rate: u32,
    pub frame_length_ms: f32,
    pub frame_shift_ms: f32,
    pub preemphasis: f32,
    pub min_level_db: f32,
    pub ref_level_db: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub base_dir: PathBuf,
    pub output: String,
    pub num_workers: usize,
    /// Directory holding `metadata.csv`; selects the metadata-paired corpus.
    pub metadata_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub power: f32,
    pub griffin_lim_iters: usize,
    pub griffin_lim_seed: u64,
    pub endpoint_threshold_db: f32,
    pub endpoint_min_silence_sec: f32,
    pub inference_threads: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            num_mels: 80,
            num_freq: 1025,
            sample_rate: 20000,
            frame_length_ms: 50.0,
            frame_shift_ms: 12.5,
            preemphasis: 0.97,
            min_level_db: -100.0,
            ref_level_db: 20.0,
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            base_dir: utils::default_base_dir(),
            output: "training".to_string(),
            num_workers: utils::cpu_count(),
            metadata_dir: None,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            power: 1.5,
            griffin_lim_iters: 60,
            griffin_lim_seed: 0,
            endpoint_threshold_db: -40.0,
            endpoint_min_silence_sec: 0.8,
            inference_threads: 4,
        }
    }
}

impl AudioConfig {
    /// FFT size derived from the number of linear frequency bins
    pub fn n_fft(&self) -> usize {
        (self.num_freq - 1) * 2
    }

    /// Samples between successive frames
    pub fn hop_length(&self) -> usize {
        (self.frame_shift_ms / 1000.0 * self.sample_rate as f32) as usize
    }

    /// Analysis window length in samples
    pub fn win_length(&self) -> usize {
        (self.frame_length_ms / 1000.0 * self.sample_rate as f32) as usize
    }

    /// Convert a frame count into hours of audio
    pub fn frames_to_hours(&self, frames: u64) -> f64 {
        frames as f64 * self.frame_shift_ms as f64 / (3600.0 * 1000.0)
    }
}

impl PreprocessConfig {
    pub fn source_dir(&self) -> PathBuf {
        self.base_dir.join("source")
    }

    pub fn target_dir(&self) -> PathBuf {
        self.base_dir.join("target")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.output)
    }
}

#[derive(Debug, Parser)]
#[command(name = "vcprep", about = "Voice conversion preprocessing and synthesis", version, author)]
pub struct Args {
    #[arg(short = 'c', long = "config", global = true, help = "Config file path (TOML format)")]
    pub config_file: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", global = true, help = "Enable verbose output mode")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract spectrogram features for a paired corpus and write train.txt
    Preprocess(PreprocessArgs),
    /// Synthesize a waveform from an input recording through a trained model
    Synthesize(SynthesizeArgs),
}

#[derive(Debug, Clone, ClapArgs)]
pub struct PreprocessArgs {
    #[arg(long = "base-dir", help = "Corpus root holding source/ and target/ (default ~/tacotron)")]
    pub base_dir: Option<PathBuf>,

    #[arg(long = "output", help = "Output subdirectory under the base directory")]
    pub output: Option<String>,

    #[arg(long = "num-workers", help = "Worker pool size (default: logical CPU count)")]
    pub num_workers: Option<usize>,

    #[arg(long = "metadata-dir", help = "Directory containing metadata.csv with source|target paths")]
    pub metadata_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SynthesizeArgs {
    #[arg(long = "checkpoint", help = "Exported acoustic model checkpoint (ONNX)")]
    pub checkpoint: PathBuf,

    #[arg(long = "model-name", default_value = "tacotron", help = "Acoustic model architecture")]
    pub model_name: String,

    #[arg(short = 'i', long = "input", help = "Input waveform (WAV)")]
    pub input: PathBuf,

    #[arg(short = 'o', long = "output", default_value = "output.wav", help = "Output waveform path")]
    pub output: PathBuf,
}

impl Config {
    /// Load the config file when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Command line arguments override config file settings
    pub fn apply_preprocess_args(&mut self, args: &PreprocessArgs) -> Result<()> {
        if let Some(base_dir) = &args.base_dir {
            self.preprocess.base_dir = base_dir.clone();
        }
        if let Some(output) = &args.output {
            self.preprocess.output = output.clone();
        }
        if let Some(num_workers) = args.num_workers {
            self.preprocess.num_workers = num_workers;
        }
        if args.metadata_dir.is_some() {
            self.preprocess.metadata_dir = args.metadata_dir.clone();
        }
        self.validate()
    }

    /// Load config from TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VcError::config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameter validity
    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if audio.sample_rate == 0 {
            return Err(VcError::config("Sample rate must be greater than 0"));
        }
        if audio.sample_rate > 192000 {
            return Err(VcError::config("Sample rate cannot exceed 192000 Hz"));
        }
        if audio.num_mels == 0 {
            return Err(VcError::config("num_mels must be greater than 0"));
        }
        if audio.num_freq < 2 {
            return Err(VcError::config("num_freq must be at least 2"));
        }
        if audio.hop_length() == 0 {
            return Err(VcError::config("frame_shift_ms is shorter than one sample"));
        }
        if audio.win_length() == 0 || audio.win_length() > audio.n_fft() {
            return Err(VcError::config(format!(
                "Window length {} must be in 1..={} (n_fft)", audio.win_length(), audio.n_fft()
            )));
        }
        if !(0.0..1.0).contains(&audio.preemphasis) {
            return Err(VcError::config("Preemphasis must be in range [0.0, 1.0)"));
        }
        if audio.min_level_db >= 0.0 {
            return Err(VcError::config("min_level_db must be negative"));
        }

        if self.preprocess.num_workers == 0 {
            return Err(VcError::config("Worker count must be greater than 0"));
        }
        if self.preprocess.output.is_empty() {
            return Err(VcError::config("Output subdirectory cannot be empty"));
        }

        let synthesis = &self.synthesis;
        if synthesis.power <= 0.0 {
            return Err(VcError::config("Griffin-Lim power must be positive"));
        }
        if synthesis.endpoint_min_silence_sec <= 0.0 {
            return Err(VcError::config("Endpoint silence window must be positive"));
        }
        if synthesis.inference_threads == 0 {
            return Err(VcError::config("Inference thread count must be greater than 0"));
        }
        if synthesis.inference_threads > i16::MAX as usize {
            return Err(VcError::config("Inference thread count is out of range"));
        }

        Ok(())
    }

    /// Save config to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VcError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VcError::config(format!("Failed to write config file: {}", e)))
    }
}

pub mod utils {
    use std::path::PathBuf;

    pub fn cpu_count() -> usize {
        num_cpus::get()
    }

    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tacotron")
    }
}
