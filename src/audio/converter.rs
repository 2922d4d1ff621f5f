//! Sample rate conversion

use ndarray::{Array1, ArrayView1};
use crate::error::{VcError, Result};

pub struct AudioConverter;

impl AudioConverter {
    /// Convert sample rate using linear interpolation
    pub fn resample(data: ArrayView1<f32>, from_rate: u32, to_rate: u32) -> Result<Array1<f32>> {
        if data.is_empty() {
            return Err(VcError::audio("Input data is empty"));
        }
        if from_rate == 0 || to_rate == 0 {
            return Err(VcError::audio("Sample rate cannot be 0"));
        }
        if from_rate == to_rate {
            return Ok(data.to_owned());
        }

        let ratio = to_rate as f64 / from_rate as f64;
        let new_length = ((data.len() as f64 * ratio) as usize).max(1);
        let last = data.len() - 1;

        let resampled = (0..new_length)
            .map(|i| {
                let old_pos = i as f64 / ratio;
                let old_index = old_pos.floor() as usize;
                if old_index >= last {
                    data[last]
                } else {
                    let fraction = (old_pos - old_index as f64) as f32;
                    data[old_index] + (data[old_index + 1] - data[old_index]) * fraction
                }
            })
            .collect();

        Ok(resampled)
    }
}
