//! Linear and mel spectrogram extraction plus Griffin-Lim reconstruction
//!
//! Follows librosa conventions: centered frames with reflect padding, a
//! periodic Hann window zero-padded to `n_fft`, and a Slaney-normalised mel
//! filterbank. All spectrograms are returned time-major (`[frames, bins]`)
//! and normalised to `[0, 1]` in the dB domain.

use std::f64::consts::PI;
use std::sync::Arc;
use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use crate::config::{AudioConfig, SynthesisConfig};
use crate::error::{VcError, Result};

/// Smallest magnitude considered before conversion to dB
const MIN_AMPLITUDE: f32 = 1e-5;

pub fn amp_to_db(x: f32) -> f32 {
    20.0 * x.max(MIN_AMPLITUDE).log10()
}

pub fn db_to_amp(x: f32) -> f32 {
    10f32.powf(x * 0.05)
}

pub struct SpectrogramExtractor {
    config: AudioConfig,
    n_fft: usize,
    hop_length: usize,
    /// `n_fft` long, the Hann window centered with zeros either side
    window: Vec<f32>,
    /// `[num_mels, num_freq]`
    mel_basis: Array2<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for SpectrogramExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramExtractor")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .field("num_mels", &self.config.num_mels)
            .finish()
    }
}

impl SpectrogramExtractor {
    pub fn new(config: &AudioConfig) -> Self {
        let n_fft = config.n_fft();
        let mut planner = FftPlanner::new();

        Self {
            n_fft,
            hop_length: config.hop_length(),
            window: centered_hann_window(config.win_length(), n_fft),
            mel_basis: mel_filterbank(config.sample_rate, n_fft, config.num_mels),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn mel_basis(&self) -> &Array2<f32> {
        &self.mel_basis
    }

    /// Number of frames produced for a waveform of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    pub fn preemphasis(&self, x: &[f32]) -> Vec<f32> {
        let k = self.config.preemphasis;
        let mut prev = 0.0;
        x.iter()
            .map(|&s| {
                let y = s - k * prev;
                prev = s;
                y
            })
            .collect()
    }

    pub fn inv_preemphasis(&self, x: &[f32]) -> Vec<f32> {
        let k = self.config.preemphasis;
        let mut prev = 0.0;
        x.iter()
            .map(|&s| {
                prev = s + k * prev;
                prev
            })
            .collect()
    }

    /// Normalised linear-frequency spectrogram, `[frames, num_freq]`
    pub fn spectrogram(&self, y: &[f32]) -> Result<Array2<f32>> {
        let magnitudes = self.stft(&self.preemphasis(y))?.mapv(|c| c.norm());
        Ok(self.to_normalized_db(magnitudes))
    }

    /// Normalised mel spectrogram, `[frames, num_mels]`
    pub fn melspectrogram(&self, y: &[f32]) -> Result<Array2<f32>> {
        let magnitudes = self.stft(&self.preemphasis(y))?.mapv(|c| c.norm());
        let mel = magnitudes.dot(&self.mel_basis.t());
        Ok(self.to_normalized_db(mel))
    }

    /// Reconstruct a waveform from a normalised linear spectrogram.
    ///
    /// The result still carries preemphasis; callers apply
    /// [`Self::inv_preemphasis`] afterwards.
    pub fn inv_spectrogram(&self, spectrogram: ArrayView2<f32>, synthesis: &SynthesisConfig) -> Result<Vec<f32>> {
        if spectrogram.ncols() != self.config.num_freq {
            return Err(VcError::feature(format!(
                "Expected {} frequency bins, got {}", self.config.num_freq, spectrogram.ncols()
            )));
        }

        let ref_level_db = self.config.ref_level_db;
        let power = synthesis.power;
        let magnitudes = spectrogram.mapv(|s| db_to_amp(self.denormalize(s) + ref_level_db).powf(power));
        self.griffin_lim(&magnitudes, synthesis.griffin_lim_iters, synthesis.griffin_lim_seed)
    }

    /// Offset where trailing near-silence begins, or `wav.len()` when there is none
    pub fn find_endpoint(&self, wav: &[f32], threshold_db: f32, min_silence_sec: f32) -> usize {
        let window_length = (self.config.sample_rate as f32 * min_silence_sec) as usize;
        let hop = window_length / 4;
        if hop == 0 {
            return wav.len();
        }

        let threshold = db_to_amp(threshold_db);
        let last_start = wav.len().saturating_sub(window_length);
        (hop..last_start)
            .step_by(hop)
            .find(|&x| {
                let peak = wav[x..x + window_length].iter().copied().fold(f32::NEG_INFINITY, f32::max);
                peak < threshold
            })
            .map_or(wav.len(), |x| x + hop)
    }

    fn normalize(&self, s: f32) -> f32 {
        let min_db = self.config.min_level_db;
        ((s - min_db) / -min_db).clamp(0.0, 1.0)
    }

    fn denormalize(&self, s: f32) -> f32 {
        let min_db = self.config.min_level_db;
        s.clamp(0.0, 1.0) * -min_db + min_db
    }

    fn to_normalized_db(&self, magnitudes: Array2<f32>) -> Array2<f32> {
        let ref_level_db = self.config.ref_level_db;
        magnitudes.mapv(|m| self.normalize(amp_to_db(m) - ref_level_db))
    }

    /// Complex STFT, `[frames, n_fft / 2 + 1]`
    pub fn stft(&self, y: &[f32]) -> Result<Array2<Complex<f32>>> {
        if y.is_empty() {
            return Err(VcError::feature("Cannot compute STFT of an empty waveform"));
        }

        let n_fft = self.n_fft;
        let pad = (n_fft / 2) as isize;
        let n_frames = self.frame_count(y.len());
        let n_bins = n_fft / 2 + 1;

        let mut output = Array2::zeros((n_frames, n_bins));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

        for (t, mut row) in output.axis_iter_mut(Axis(0)).enumerate() {
            let start = (t * self.hop_length) as isize - pad;
            for (j, slot) in buffer.iter_mut().enumerate() {
                let sample = y[reflect_index(start + j as isize, y.len())];
                *slot = Complex::new(sample * self.window[j], 0.0);
            }
            self.forward.process(&mut buffer);
            for (dst, src) in row.iter_mut().zip(buffer.iter()) {
                *dst = *src;
            }
        }

        Ok(output)
    }

    /// Inverse STFT with window-sum-square normalisation.
    ///
    /// Output length is `hop_length * (frames - 1)`, matching the centered STFT.
    pub fn istft(&self, spectrum: &Array2<Complex<f32>>) -> Vec<f32> {
        let n_fft = self.n_fft;
        let n_frames = spectrum.nrows();
        if n_frames == 0 {
            return Vec::new();
        }

        let full_len = n_fft + self.hop_length * (n_frames - 1);
        let mut signal = vec![0.0f32; full_len];
        let mut window_sum = vec![0.0f32; full_len];
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let scale = 1.0 / n_fft as f32;

        for (t, row) in spectrum.axis_iter(Axis(0)).enumerate() {
            // Rebuild the full Hermitian spectrum from the one-sided bins.
            for (k, slot) in buffer.iter_mut().enumerate() {
                *slot = if k < row.len() {
                    row[k]
                } else {
                    row[n_fft - k].conj()
                };
            }
            self.inverse.process(&mut buffer);

            let offset = t * self.hop_length;
            for (j, value) in buffer.iter().enumerate() {
                let w = self.window[j];
                signal[offset + j] += value.re * scale * w;
                window_sum[offset + j] += w * w;
            }
        }

        for (s, &w) in signal.iter_mut().zip(window_sum.iter()) {
            if w > f32::MIN_POSITIVE {
                *s /= w;
            }
        }

        let half = n_fft / 2;
        signal[half..full_len - half].to_vec()
    }

    fn griffin_lim(&self, magnitudes: &Array2<f32>, iterations: usize, seed: u64) -> Result<Vec<f32>> {
        if magnitudes.nrows() < 2 {
            return Err(VcError::feature("Spectrogram needs at least two frames for reconstruction"));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let phases = magnitudes.mapv(|_| Complex::from_polar(1.0f32, 2.0 * std::f32::consts::PI * rng.r#gen::<f32>()));
        let mut y = self.istft(&(phases * magnitudes.mapv(|m| Complex::new(m, 0.0))));

        for i in 0..iterations {
            let rebuilt = self.stft(&y)?;
            let spectrum = ndarray::Zip::from(&rebuilt)
                .and(magnitudes)
                .map_collect(|c, &m| Complex::from_polar(m, c.arg()));
            y = self.istft(&spectrum);
            log::trace!("Griffin-Lim iteration {}/{}", i + 1, iterations);
        }

        Ok(y)
    }
}

/// Index into `len` samples with numpy-style reflect padding (edge not repeated)
fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let j = i.rem_euclid(period);
    if j >= len as isize {
        (period - j) as usize
    } else {
        j as usize
    }
}

/// Periodic Hann window of `win_length` centered inside `n_fft` zeros
fn centered_hann_window(win_length: usize, n_fft: usize) -> Vec<f32> {
    let mut window = vec![0.0f32; n_fft];
    let offset = (n_fft - win_length) / 2;
    for i in 0..win_length {
        window[offset + i] = (0.5 - 0.5 * (2.0 * PI * i as f64 / win_length as f64).cos()) as f32;
    }
    window
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
fn hz_to_mel(f: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    let logstep = 6.4f64.ln() / 27.0;

    if f < MIN_LOG_HZ {
        f / F_SP
    } else {
        MIN_LOG_HZ / F_SP + (f / MIN_LOG_HZ).ln() / logstep
    }
}

fn mel_to_hz(m: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    let min_log_mel = MIN_LOG_HZ / F_SP;
    let logstep = 6.4f64.ln() / 27.0;

    if m < min_log_mel {
        m * F_SP
    } else {
        MIN_LOG_HZ * ((m - min_log_mel) * logstep).exp()
    }
}

/// Triangular filterbank over 0..sr/2 with Slaney area normalisation, `[n_mels, n_fft / 2 + 1]`
fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    let n_freqs = n_fft / 2 + 1;
    let fmax = sample_rate as f64 / 2.0;
    let mel_max = hz_to_mel(fmax);

    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();
    let fft_freqs: Vec<f64> = (0..n_freqs)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mut basis = Array2::zeros((n_mels, n_freqs));
    for (i, mut filter) in basis.axis_iter_mut(Axis(0)).enumerate() {
        let (lower_hz, center_hz, upper_hz) = (mel_f[i], mel_f[i + 1], mel_f[i + 2]);
        let enorm = 2.0 / (upper_hz - lower_hz);
        for (weight, &freq) in filter.iter_mut().zip(fft_freqs.iter()) {
            let rising = (freq - lower_hz) / (center_hz - lower_hz);
            let falling = (upper_hz - freq) / (upper_hz - center_hz);
            *weight = (rising.min(falling).max(0.0) * enorm) as f32;
        }
    }
    basis
}
