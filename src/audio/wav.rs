//! WAV audio file processing

use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use ndarray::{Array1, Array2, Axis};
use crate::audio::AudioConverter;
use crate::error::{VcError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Int8,
    Int16,
    Int24,
    Int32,
    Float32,
}

impl AudioFormat {
    /// Map a WAV sample format and bit depth onto a supported format
    pub fn from_spec(sample_format: SampleFormat, bits_per_sample: u16) -> Result<Self> {
        match (sample_format, bits_per_sample) {
            (SampleFormat::Int, 8) => Ok(AudioFormat::Int8),
            (SampleFormat::Int, 16) => Ok(AudioFormat::Int16),
            (SampleFormat::Int, 24) => Ok(AudioFormat::Int24),
            (SampleFormat::Int, 32) => Ok(AudioFormat::Int32),
            (SampleFormat::Float, 32) => Ok(AudioFormat::Float32),
            (format, bits) => Err(VcError::audio(format!(
                "Unsupported sample format: {:?} at {} bits", format, bits
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AudioFormat::Int8 => "int8",
            AudioFormat::Int16 => "int16",
            AudioFormat::Int24 => "int24",
            AudioFormat::Int32 => "int32",
            AudioFormat::Float32 => "float32",
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            AudioFormat::Int8 => 8,
            AudioFormat::Int16 => 16,
            AudioFormat::Int24 => 24,
            AudioFormat::Int32 | AudioFormat::Float32 => 32,
        }
    }

    pub fn to_sample_format(self) -> SampleFormat {
        match self {
            AudioFormat::Float32 => SampleFormat::Float,
            _ => SampleFormat::Int,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: AudioFormat,
    pub total_samples: u32,
    pub duration: f64,
}

impl AudioHeader {
    pub fn new(sample_rate: u32, channels: u16, format: AudioFormat, total_samples: u32) -> Self {
        Self {
            sample_rate,
            channels,
            format,
            total_samples,
            duration: total_samples as f64 / sample_rate as f64,
        }
    }

    pub fn to_wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.format.bits_per_sample(),
            sample_format: self.format.to_sample_format(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AudioData {
    Mono(Array1<f32>),
    /// `[frames, channels]`, two or more channels
    Multichannel(Array2<f32>),
}

impl AudioData {
    pub fn len(&self) -> usize {
        match self {
            AudioData::Mono(data) => data.len(),
            AudioData::Multichannel(data) => data.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channels(&self) -> u16 {
        match self {
            AudioData::Mono(_) => 1,
            AudioData::Multichannel(data) => data.ncols() as u16,
        }
    }

    /// Average all channels of each frame
    pub fn to_mono(&self) -> Array1<f32> {
        match self {
            AudioData::Mono(data) => data.clone(),
            AudioData::Multichannel(data) => data
                .mean_axis(Axis(1))
                .unwrap_or_else(|| Array1::zeros(data.nrows())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WavAudio {
    pub header: AudioHeader,
    pub data: AudioData,
}

impl WavAudio {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .map_err(|e| VcError::audio(format!("Cannot open audio file {}: {}", path.display(), e)))?;

        Self::from_reader(file).map_err(|e| match e {
            VcError::Audio { message } => VcError::audio(format!("{}: {}", path.display(), message)),
            other => other,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = WavReader::new(reader)
            .map_err(|e| VcError::audio(format!("Cannot create WAV reader: {}", e)))?;

        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(VcError::audio("Invalid sample rate"));
        }
        if spec.channels == 0 {
            return Err(VcError::audio("WAV file declares no channels"));
        }

        let format = AudioFormat::from_spec(spec.sample_format, spec.bits_per_sample)?;
        let samples: Vec<f32> = match format {
            AudioFormat::Float32 => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()?,
            _ => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale))
                    .collect::<std::result::Result<Vec<f32>, _>>()?
            }
        };

        let channels = spec.channels as usize;
        let data = if channels == 1 {
            AudioData::Mono(Array1::from(samples))
        } else {
            let frames = samples.len() / channels;
            let mut samples = samples;
            samples.truncate(frames * channels);
            let interleaved = Array2::from_shape_vec((frames, channels), samples)
                .map_err(|e| VcError::audio(format!("Malformed {}-channel data: {}", channels, e)))?;
            AudioData::Multichannel(interleaved)
        };

        Ok(WavAudio {
            header: AudioHeader::new(spec.sample_rate, spec.channels, format, data.len() as u32),
            data,
        })
    }

    pub fn new_mono(sample_rate: u32, data: Array1<f32>, format: AudioFormat) -> Self {
        let header = AudioHeader::new(sample_rate, 1, format, data.len() as u32);
        WavAudio { header, data: AudioData::Mono(data) }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VcError::audio(format!("Cannot create output directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| VcError::audio(format!("Cannot create output file {}: {}", path.display(), e)))?;
        self.write_to(std::io::BufWriter::new(file))
    }

    fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let spec = self.header.to_wav_spec();
        let mut writer = WavWriter::new(writer, spec)?;

        let format = self.header.format;
        let peak = ((1i64 << (format.bits_per_sample() - 1)) - 1) as f32;
        let mut write_sample = |sample: f32| -> Result<()> {
            let clamped = sample.clamp(-1.0, 1.0);
            match format {
                AudioFormat::Float32 => writer.write_sample(clamped)?,
                AudioFormat::Int8 => writer.write_sample((clamped * peak) as i8)?,
                AudioFormat::Int16 => writer.write_sample((clamped * peak) as i16)?,
                AudioFormat::Int24 | AudioFormat::Int32 => writer.write_sample((clamped * peak) as i32)?,
            }
            Ok(())
        };

        match &self.data {
            AudioData::Mono(data) => {
                for &sample in data.iter() {
                    write_sample(sample)?;
                }
            }
            // row-major `[frames, channels]` is already interleaved
            AudioData::Multichannel(data) => {
                for &sample in data.iter() {
                    write_sample(sample)?;
                }
            }
        }

        writer.finalize()?;
        Ok(())
    }

    pub fn data(&self) -> &AudioData {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    pub fn total_samples(&self) -> u32 {
        self.header.total_samples
    }

    pub fn duration(&self) -> f64 {
        self.header.duration
    }
}

/// Read a waveform as mono f32 samples at `sample_rate`.
///
/// Multi-channel input is averaged down and other rates are linearly resampled.
pub fn load_wav<P: AsRef<Path>>(path: P, sample_rate: u32) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let audio = WavAudio::from_file(path)?;
    if audio.data().is_empty() {
        return Err(VcError::audio(format!("{}: no samples", path.display())));
    }

    let mono = audio.data().to_mono();
    if audio.sample_rate() == sample_rate {
        return Ok(mono.to_vec());
    }

    log::debug!(
        "Resampling {} from {} Hz to {} Hz", path.display(), audio.sample_rate(), sample_rate
    );
    Ok(AudioConverter::resample(mono.view(), audio.sample_rate(), sample_rate)?.to_vec())
}

/// Peak-normalise to 16-bit PCM and encode as a mono WAV file in memory.
///
/// Gain is `32767 / max(0.01, peak)`, so near-silent input is not blown up.
pub fn encode_wav(wav: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let peak = wav.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    let gain = 32767.0 / peak.max(0.01);

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + wav.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in wav {
            writer.write_sample((sample * gain).clamp(-32768.0, 32767.0) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_audio_format() {
        assert_eq!(AudioFormat::Int16.name(), "int16");
        assert_eq!(AudioFormat::Int16.bits_per_sample(), 16);
        assert_eq!(AudioFormat::Float32.name(), "float32");
        assert_eq!(AudioFormat::Float32.bits_per_sample(), 32);
    }

    #[test]
    fn test_audio_header_creation() {
        let header = AudioHeader::new(16000, 1, AudioFormat::Float32, 1000);
        assert_eq!(header.total_samples, 1000);
        assert!((header.duration - 0.0625).abs() < f64::EPSILON);
        assert_eq!(header.to_wav_spec().bits_per_sample, 32);
    }

    #[test]
    fn test_format_from_spec() {
        assert_eq!(AudioFormat::from_spec(SampleFormat::Int, 24).unwrap(), AudioFormat::Int24);
        assert_eq!(AudioFormat::Int24.bits_per_sample(), 24);
        assert_eq!(AudioFormat::Int8.to_sample_format(), SampleFormat::Int);
        assert!(AudioFormat::from_spec(SampleFormat::Int, 12).is_err());
        assert!(AudioFormat::from_spec(SampleFormat::Float, 64).is_err());
    }

    #[test]
    fn test_multichannel_to_mono() {
        let stereo = AudioData::Multichannel(Array2::from(vec![[0.2, 0.4], [-1.0, 1.0]]));
        assert_eq!(stereo.len(), 2);
        assert_eq!(stereo.channels(), 2);
        let mono = stereo.to_mono();
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!(mono[1].abs() < 1e-6);

        let quad = AudioData::Multichannel(Array2::from(vec![[0.4, 0.2, 0.0, -0.2]]));
        assert_eq!(quad.channels(), 4);
        assert!((quad.to_mono()[0] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_load_wav_downmixes_four_channels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quad.wav");
        let spec = WavSpec {
            channels: 4,
            sample_rate: 20000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..300 {
            for value in [16384i16, 8192, 0, -8192] {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();

        let audio = WavAudio::from_file(&path).unwrap();
        assert_eq!(audio.channels(), 4);
        assert_eq!(audio.total_samples(), 300);

        let samples = load_wav(&path, 20000).unwrap();
        assert_eq!(samples.len(), 300);
        // (0.5 + 0.25 + 0 - 0.25) / 4
        assert!(samples.iter().all(|&s| (s - 0.125).abs() < 1e-6));
    }

    #[test]
    fn test_integer_depths_roundtrip() {
        let dir = TempDir::new().unwrap();
        let data = Array1::from(vec![0.5f32, -0.25, 0.0, 0.9]);

        for (format, tolerance) in [
            (AudioFormat::Int8, 1.5e-2),
            (AudioFormat::Int24, 1e-5),
            (AudioFormat::Int32, 1e-5),
        ] {
            let path = dir.path().join(format!("{}.wav", format.name()));
            WavAudio::new_mono(16000, data.clone(), format).save_to_file(&path).unwrap();

            let loaded = WavAudio::from_file(&path).unwrap();
            assert_eq!(loaded.header.format, format);
            assert_eq!(loaded.header.to_wav_spec().bits_per_sample, format.bits_per_sample());

            let samples = load_wav(&path, 16000).unwrap();
            assert_eq!(samples.len(), 4);
            for (a, b) in samples.iter().zip(data.iter()) {
                assert!((a - b).abs() < tolerance, "{}: {} vs {}", format.name(), a, b);
            }
        }
    }

    #[test]
    fn test_decode_error_names_file_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"not a wav").unwrap();

        let message = WavAudio::from_file(&path).unwrap_err().to_string();
        assert_eq!(message.matches("Audio error").count(), 1);
        assert!(message.contains("broken.wav"));
    }

    #[test]
    fn test_wav_file_roundtrip() {
        let data = Array1::from(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        let original = WavAudio::new_mono(16000, data.clone(), AudioFormat::Float32);

        let temp_file = NamedTempFile::new().unwrap();
        original.save_to_file(temp_file.path()).unwrap();
        let loaded = WavAudio::from_file(temp_file.path()).unwrap();

        assert_eq!(loaded.sample_rate(), 16000);
        assert_eq!(loaded.channels(), 1);
        assert_eq!(loaded.total_samples(), 5);
        match loaded.data() {
            AudioData::Mono(loaded_data) => {
                for (a, b) in loaded_data.iter().zip(data.iter()) {
                    assert!((a - b).abs() < 1e-6);
                }
            }
            _ => panic!("Audio data format mismatch"),
        }
    }

    #[test]
    fn test_load_wav_resamples_int16() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        let data = Array1::from(vec![0.5f32; 800]);
        WavAudio::new_mono(8000, data, AudioFormat::Int16).save_to_file(&path).unwrap();

        let samples = load_wav(&path, 16000).unwrap();
        assert_eq!(samples.len(), 1600);
        assert!((samples[10] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_load_wav_missing_file() {
        let err = load_wav("/nonexistent/file.wav", 16000).unwrap_err();
        assert!(matches!(err, VcError::Audio { .. }));
    }

    #[test]
    fn test_encode_wav_peak_normalises() {
        let bytes = encode_wav(&[0.0, 0.5, -0.25], 20000).unwrap();
        let decoded = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoded.spec().sample_rate, 20000);
        assert_eq!(decoded.spec().bits_per_sample, 16);
        let samples: Vec<i16> = decoded.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 32767, -16383]);
    }

    #[test]
    fn test_encode_wav_quiet_signal_not_amplified_past_floor() {
        let bytes = encode_wav(&[0.001], 20000).unwrap();
        let decoded = WavReader::new(Cursor::new(bytes)).unwrap();
        let samples: Vec<i16> = decoded.into_samples::<i16>().map(|s| s.unwrap()).collect();
        // 0.001 * 32767 / 0.01
        assert_eq!(samples, vec![3276]);
    }
}
