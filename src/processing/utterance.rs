//! Per-pair feature extraction and array serialization

use std::fmt;
use std::path::Path;
use ndarray::Array2;
use ndarray_npy::write_npy;
use crate::audio::{load_wav, SpectrogramExtractor};
use crate::error::Result;
use super::CorpusPair;

/// Kinds of arrays written for every pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    SourceMel,
    TargetSpectrogram,
    TargetMel,
}

impl FeatureKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::SourceMel => "source-mel",
            Self::TargetSpectrogram => "target-spec",
            Self::TargetMel => "target-mel",
        }
    }

    /// `<prefix>-%05d.npy`
    pub fn filename(&self, index: usize) -> String {
        format!("{}-{:05}.npy", self.prefix(), index)
    }
}

/// One line of `train.txt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRecord {
    pub source_mel_filename: String,
    /// Time frames in the target linear spectrogram
    pub frame_count: usize,
    pub target_spectrogram_filename: String,
    pub target_mel_filename: String,
}

impl fmt::Display for ProcessingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.source_mel_filename,
            self.frame_count,
            self.target_spectrogram_filename,
            self.target_mel_filename
        )
    }
}

/// Load both waveforms, write the three feature arrays and describe them.
///
/// `index` is the 1-based position of the pair and is embedded in every filename.
pub fn process_utterance(
    extractor: &SpectrogramExtractor,
    out_dir: &Path,
    index: usize,
    pair: &CorpusPair,
) -> Result<ProcessingRecord> {
    let sample_rate = extractor.config().sample_rate;
    let source_wav = load_wav(&pair.source, sample_rate)?;
    let target_wav = load_wav(&pair.target, sample_rate)?;

    let target_spectrogram = extractor.spectrogram(&target_wav)?;
    let frame_count = target_spectrogram.nrows();

    let source_mel = extractor.melspectrogram(&source_wav)?;
    let target_mel = extractor.melspectrogram(&target_wav)?;

    let record = ProcessingRecord {
        source_mel_filename: FeatureKind::SourceMel.filename(index),
        frame_count,
        target_spectrogram_filename: FeatureKind::TargetSpectrogram.filename(index),
        target_mel_filename: FeatureKind::TargetMel.filename(index),
    };

    save_array(out_dir, &record.source_mel_filename, &source_mel)?;
    save_array(out_dir, &record.target_spectrogram_filename, &target_spectrogram)?;
    save_array(out_dir, &record.target_mel_filename, &target_mel)?;

    log::debug!("#{:05}: {} frames", index, frame_count);
    Ok(record)
}

fn save_array(out_dir: &Path, filename: &str, array: &Array2<f32>) -> Result<()> {
    write_npy(out_dir.join(filename), array)?;
    Ok(())
}
