//! Preprocessing pipeline: pair resolution, dispatch, index writing

use std::path::PathBuf;
use std::time::Instant;
use crate::config::Config;
use crate::error::Result;
use super::{
    pairs_from_directories, pairs_from_metadata, write_metadata, CorpusPair, IndexSummary,
    ParallelProcessor,
};

/// How source/target pairs are discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusLayout {
    /// `<base>/source/wavs` and `<base>/target/wavs` matched by sorted name
    Directories { source_dir: PathBuf, target_dir: PathBuf },
    /// `<data_dir>/metadata.csv` listing `source|target` per line
    Metadata { data_dir: PathBuf },
}

impl CorpusLayout {
    pub fn from_config(config: &Config) -> Self {
        match &config.preprocess.metadata_dir {
            Some(data_dir) => Self::Metadata { data_dir: data_dir.clone() },
            None => Self::Directories {
                source_dir: config.preprocess.source_dir(),
                target_dir: config.preprocess.target_dir(),
            },
        }
    }

    pub fn resolve_pairs(&self) -> Result<Vec<CorpusPair>> {
        match self {
            Self::Directories { source_dir, target_dir } => pairs_from_directories(source_dir, target_dir),
            Self::Metadata { data_dir } => pairs_from_metadata(data_dir),
        }
    }
}

#[derive(Debug)]
pub struct PreprocessResult {
    pub output_dir: PathBuf,
    pub summary: IndexSummary,
    pub processing_time_secs: f64,
}

/// Run the full preprocessing pipeline described by `config`.
///
/// Nothing is written if pairing fails; `train.txt` is only written once
/// every pair has been processed successfully.
pub fn preprocess(config: &Config) -> Result<PreprocessResult> {
    let start = Instant::now();
    let layout = CorpusLayout::from_config(config);
    let output_dir = config.preprocess.output_dir();

    let pairs = layout.resolve_pairs()?;
    log::info!("Resolved {} pairs from {:?}", pairs.len(), layout);

    std::fs::create_dir_all(&output_dir)?;
    let processor = ParallelProcessor::new(&config.audio, &output_dir, config.preprocess.num_workers)?;
    let records = processor.process_pairs(&pairs)?;
    let summary = write_metadata(&records, &output_dir, &config.audio)?;

    Ok(PreprocessResult {
        output_dir,
        summary,
        processing_time_secs: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_layout_from_config() {
        let mut config = Config::default();
        config.preprocess.base_dir = PathBuf::from("/vc");

        assert_eq!(
            CorpusLayout::from_config(&config),
            CorpusLayout::Directories {
                source_dir: PathBuf::from("/vc/source"),
                target_dir: PathBuf::from("/vc/target"),
            }
        );

        config.preprocess.metadata_dir = Some(PathBuf::from("/raw"));
        assert_eq!(
            CorpusLayout::from_config(&config),
            CorpusLayout::Metadata { data_dir: Path::new("/raw").to_path_buf() }
        );
    }

    #[test]
    fn test_pairing_failure_writes_nothing() {
        let root = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.preprocess.base_dir = root.path().to_path_buf();

        assert!(preprocess(&config).is_err());
        assert!(!root.path().join("training").exists());
    }
}
