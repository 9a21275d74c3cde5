use std::{f64::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex64, RealFftPlanner, RealToComplex};

use crate::{Result, WaveformSample};

/// Minimum number of samples needed for a meaningful spectrum.
const MIN_SAMPLES: usize = 8;

/// Estimates the dominant frequency of a displayed waveform.
///
/// Used to cross-check the analytic Doppler value against the synthesized
/// observed signal. The plan is cached per window length.
pub struct SpectrumAnalyzer {
    planner: RealFftPlanner<f64>,
    fft: Option<FftResources>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
            fft: None,
        }
    }

    /// Dominant frequency in Hz of `values` spaced `spacing` seconds apart.
    ///
    /// Returns `None` for short or silent input, or a degenerate spacing.
    pub fn dominant_frequency(&mut self, values: &[f64], spacing: f64) -> Result<Option<f64>> {
        let len = values.len();
        if len < MIN_SAMPLES || !(spacing.is_finite() && spacing > 0.0) {
            return Ok(None);
        }

        let fft = self.prepare_fft(len);
        let mean = values.iter().sum::<f64>() / len as f64;
        for (index, value) in values.iter().enumerate() {
            fft.input[index] = (value - mean) * hann_value(index, len);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let peak = fft
            .spectrum
            .iter()
            .enumerate()
            .skip(1)
            .map(|(bin, value)| (bin, value.norm()))
            .fold(None, |best: Option<(usize, f64)>, (bin, magnitude)| match best {
                Some((_, best_magnitude)) if best_magnitude >= magnitude => best,
                _ => Some((bin, magnitude)),
            });

        Ok(match peak {
            Some((bin, magnitude)) if magnitude > f64::EPSILON => {
                Some(bin as f64 / (len as f64 * spacing))
            }
            _ => None,
        })
    }

    /// Runs [`Self::dominant_frequency`] over time-tagged samples, deriving
    /// the spacing from the span of their `t` values.
    pub fn dominant_frequency_of(&mut self, samples: &[WaveformSample]) -> Result<Option<f64>> {
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Ok(None);
        };
        if samples.len() < 2 {
            return Ok(None);
        }

        let spacing = (last.t - first.t) / (samples.len() - 1) as f64;
        let values: Vec<f64> = samples.iter().map(|sample| sample.y).collect();
        self.dominant_frequency(&values, spacing)
    }

    fn prepare_fft(&mut self, size: usize) -> &mut FftResources {
        let planner = &mut self.planner;
        let fft = self
            .fft
            .get_or_insert_with(|| FftResources::plan(planner, size));
        if fft.size != size {
            *fft = FftResources::plan(planner, size);
        }
        fft
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f64>>,
    scratch: Vec<Complex64>,
    spectrum: Vec<Complex64>,
    input: Vec<f64>,
}

impl FftResources {
    fn plan(planner: &mut RealFftPlanner<f64>, size: usize) -> Self {
        let plan = planner.plan_fft_forward(size);
        Self {
            size,
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("window", &self.fft.as_ref().map(|fft| fft.size))
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f64 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f64) / (len as f64 - 1.0)).cos()
}
