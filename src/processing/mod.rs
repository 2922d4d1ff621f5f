//! Corpus Preprocessing Pipeline

pub mod pairing;
pub mod utterance;
pub mod parallel_processor;
pub mod index;
pub mod processor;

pub use pairing::{CorpusPair, pairs_from_directories, pairs_from_metadata, parse_metadata};
pub use utterance::{FeatureKind, ProcessingRecord, process_utterance};
pub use parallel_processor::ParallelProcessor;
pub use index::{IndexSummary, write_metadata, INDEX_FILE};
pub use processor::{CorpusLayout, PreprocessResult, preprocess};
