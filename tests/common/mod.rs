//! Shared corpus fixtures for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use hound::{SampleFormat, WavSpec, WavWriter};

pub const SAMPLE_RATE: u32 = 20000;

/// Write a 16-bit mono tone of `len` samples
pub fn write_tone(path: &Path, freq: f32, len: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..len {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = 0.4 * (2.0 * std::f32::consts::PI * freq * t).sin();
        writer.write_sample((sample * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// `<base>/source/wavs/*` and `<base>/target/wavs/*` with matching names
pub fn directory_corpus(base: &Path, names: &[&str]) {
    for (i, name) in names.iter().enumerate() {
        let len = 4000 + i * 1000;
        write_tone(&base.join("source").join("wavs").join(name), 220.0, len);
        write_tone(&base.join("target").join("wavs").join(name), 330.0, len + 500);
    }
}

/// Sorted list of file names in `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn output_dir(base: &Path) -> PathBuf {
    base.join("training")
}
