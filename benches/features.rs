//! Feature extraction benchmarks.
//!
//! Run with: `cargo bench -- features`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::f32::consts::PI;
use std::hint::black_box;
use vcprep::audio::SpectrogramExtractor;
use vcprep::config::{AudioConfig, SynthesisConfig};

fn sine_wave(duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let n = (duration_secs * sample_rate as f32) as usize;
    (0..n)
        .map(|i| 0.5 * (2.0 * PI * 220.0 * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn bench_spectrograms(c: &mut Criterion) {
    let config = AudioConfig::default();
    let extractor = SpectrogramExtractor::new(&config);
    let mut group = c.benchmark_group("features");

    for duration in [1.0, 5.0] {
        let samples = sine_wave(duration, config.sample_rate);
        group.bench_with_input(BenchmarkId::new("linear", format!("{duration}s")), &samples, |b, s| {
            b.iter(|| extractor.spectrogram(black_box(s)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("mel", format!("{duration}s")), &samples, |b, s| {
            b.iter(|| extractor.melspectrogram(black_box(s)).unwrap());
        });
    }
    group.finish();
}

fn bench_griffin_lim(c: &mut Criterion) {
    let config = AudioConfig::default();
    let extractor = SpectrogramExtractor::new(&config);
    let synthesis = SynthesisConfig { griffin_lim_iters: 10, ..Default::default() };
    let spec = extractor.spectrogram(&sine_wave(1.0, config.sample_rate)).unwrap();

    c.bench_function("griffin_lim_10_iters_1s", |b| {
        b.iter(|| extractor.inv_spectrogram(black_box(spec.view()), &synthesis).unwrap());
    });
}

criterion_group!(benches, bench_spectrograms, bench_griffin_lim);
criterion_main!(benches);
