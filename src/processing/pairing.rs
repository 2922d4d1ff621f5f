//! Source/target pair resolution for parallel corpora

use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{VcError, Result};

/// Subdirectory holding the waveforms of a directory-paired corpus side
pub const WAVS_DIR: &str = "wavs";
/// Pair listing inside a metadata-paired corpus
pub const METADATA_FILE: &str = "metadata.csv";

/// One utterance recorded under two acoustic conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusPair {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl CorpusPair {
    pub fn new<S: Into<PathBuf>, T: Into<PathBuf>>(source: S, target: T) -> Self {
        Self { source: source.into(), target: target.into() }
    }
}

/// Pair `<source_dir>/wavs/*` with `<target_dir>/wavs/*` by sorted file name.
///
/// The sorted listings must match name for name; any divergence fails the
/// whole run before a single pair is processed.
pub fn pairs_from_directories(source_dir: &Path, target_dir: &Path) -> Result<Vec<CorpusPair>> {
    let source_wavs = source_dir.join(WAVS_DIR);
    let target_wavs = target_dir.join(WAVS_DIR);
    let source_names = sorted_file_names(&source_wavs)?;
    let target_names = sorted_file_names(&target_wavs)?;

    if source_names.len() != target_names.len() {
        return Err(VcError::pairing(format!(
            "{} has {} files but {} has {}",
            source_wavs.display(), source_names.len(), target_wavs.display(), target_names.len()
        )));
    }

    source_names
        .iter()
        .zip(target_names.iter())
        .enumerate()
        .map(|(i, (source, target))| {
            if source != target {
                return Err(VcError::pairing(format!(
                    "File #{} differs between source and target: {:?} vs {:?}", i + 1, source, target
                )));
            }
            Ok(CorpusPair::new(source_wavs.join(source), target_wavs.join(target)))
        })
        .collect()
}

/// Read `<data_dir>/metadata.csv`; paths in it are relative to `data_dir`.
pub fn pairs_from_metadata(data_dir: &Path) -> Result<Vec<CorpusPair>> {
    let metadata_path = data_dir.join(METADATA_FILE);
    let content = fs::read_to_string(&metadata_path)
        .map_err(|e| VcError::pairing(format!("Cannot read {}: {}", metadata_path.display(), e)))?;
    parse_metadata(&content, data_dir)
}

/// Parse `source|target[|...]` lines. Blank lines are skipped, extra fields ignored.
pub fn parse_metadata(content: &str, data_dir: &Path) -> Result<Vec<CorpusPair>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            let mut fields = line.trim().split('|').map(str::trim);
            match (fields.next(), fields.next()) {
                (Some(source), Some(target)) if !source.is_empty() && !target.is_empty() => {
                    Ok(CorpusPair::new(data_dir.join(source), data_dir.join(target)))
                }
                _ => Err(VcError::pairing(format!(
                    "{} line {}: expected source|target, got {:?}", METADATA_FILE, line_no + 1, line
                ))),
            }
        })
        .collect()
}

fn sorted_file_names(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| VcError::pairing(format!("Cannot list {}: {}", dir.display(), e)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
