//! Parallel utterance processing on a bounded worker pool

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::audio::SpectrogramExtractor;
use crate::config::AudioConfig;
use crate::error::{VcError, Result};
use super::{process_utterance, CorpusPair, ProcessingRecord};

pub struct ParallelProcessor {
    extractor: SpectrogramExtractor,
    pool: ThreadPool,
    out_dir: PathBuf,
}

impl ParallelProcessor {
    pub fn new(audio: &AudioConfig, out_dir: &Path, num_workers: usize) -> Result<Self> {
        let num_workers = num_workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("vcprep-worker-{}", i))
            .build()
            .map_err(|e| VcError::config(format!("Failed to build worker pool: {}", e)))?;

        Ok(Self {
            extractor: SpectrogramExtractor::new(audio),
            pool,
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Process every pair, returning records in input order.
    ///
    /// Pair `i` (0-based) writes files numbered `i + 1`. Every task runs to
    /// completion; if any failed, the error of the earliest failing pair is
    /// returned and no records are.
    pub fn process_pairs(&self, pairs: &[CorpusPair]) -> Result<Vec<ProcessingRecord>> {
        let start = Instant::now();
        let total = pairs.len();
        let progress_step = (total / 10).max(1);
        let completed = AtomicUsize::new(0);

        for (i, pair) in pairs.iter().enumerate() {
            log::debug!("#{:05} source: {}, target: {}", i + 1, pair.source.display(), pair.target.display());
        }

        let results: Vec<Result<ProcessingRecord>> = self.pool.install(|| {
            pairs
                .par_iter()
                .enumerate()
                .map(|(i, pair)| {
                    let index = i + 1;
                    let result = process_utterance(&self.extractor, &self.out_dir, index, pair)
                        .map_err(|e| VcError::processing(index, format!("{}: {}", pair.source.display(), e)));

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % progress_step == 0 || done == total {
                        log::info!("Processed {}/{} utterances", done, total);
                    }
                    result
                })
                .collect()
        });

        let records = results.into_iter().collect::<Result<Vec<_>>>()?;
        log::info!(
            "Processed {} pairs on {} workers in {:.2}s",
            records.len(), self.worker_count(), start.elapsed().as_secs_f64()
        );
        Ok(records)
    }
}
