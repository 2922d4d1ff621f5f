//! Audio Processing Module
//!
//! WAV reading and writing, sample rate conversion, and spectrogram features.

pub mod wav;
pub mod converter;
pub mod spectrogram;

pub use wav::{WavAudio, AudioFormat, AudioHeader, AudioData, load_wav, encode_wav};
pub use converter::AudioConverter;
pub use spectrogram::{SpectrogramExtractor, amp_to_db, db_to_amp};
