//! Training index (`train.txt`) writer

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::config::AudioConfig;
use crate::error::Result;
use super::ProcessingRecord;

pub const INDEX_FILE: &str = "train.txt";

/// Aggregate statistics over a written index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    pub utterances: usize,
    pub frames: u64,
    pub hours: f64,
    pub max_frames: usize,
}

impl IndexSummary {
    pub fn from_records(records: &[ProcessingRecord], audio: &AudioConfig) -> Self {
        let frames: u64 = records.iter().map(|r| r.frame_count as u64).sum();
        Self {
            utterances: records.len(),
            frames,
            hours: audio.frames_to_hours(frames),
            max_frames: records.iter().map(|r| r.frame_count).max().unwrap_or(0),
        }
    }
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wrote {} utterances, {} frames ({:.2} hours)", self.utterances, self.frames, self.hours)?;
        write!(f, "Max output length: {}", self.max_frames)
    }
}

/// Write one pipe-delimited line per record to `<out_dir>/train.txt`
pub fn write_metadata(records: &[ProcessingRecord], out_dir: &Path, audio: &AudioConfig) -> Result<IndexSummary> {
    let path = out_dir.join(INDEX_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    for record in records {
        writeln!(writer, "{}", record)?;
    }
    writer.flush()?;

    let summary = IndexSummary::from_records(records, audio);
    log::info!("Index written to {} ({} lines)", path.display(), summary.utterances);
    Ok(summary)
}
