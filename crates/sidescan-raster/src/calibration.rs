//! Intensity calibration: port/starboard normalization, time-varied gain,
//! and a min/window contrast stretch.

use serde::{Deserialize, Serialize};

/// Calibration knobs applied to one ping's decoded samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Divisor applied to each side's mean intensity.
    pub normalization: f64,
    /// Time-varied gain divisor; larger values flatten the gain curve.
    pub tvg_gain: f64,
    /// Lower edge of the contrast window, clamped to `[0, 1]`.
    pub min_value: f64,
    /// Width of the contrast window.
    pub window_value: f64,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            normalization: 0.2,
            tvg_gain: 280.0,
            min_value: 0.0,
            window_value: 1.0,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize each side of a ping by its mean, apply a logarithmic
/// time-varied gain that grows toward the outer edges, and stretch the
/// result into the `[min, min + window]` contrast window.
///
/// The port side is `data[..len / 2]`, starboard the rest. Samples at the
/// nadir edge may come out infinite or NaN; colormaps clamp them. The input
/// is not modified.
#[must_use]
pub fn apply_normalization_and_tvg(data: &[f64], params: &CalibrationParams) -> Vec<f64> {
    let middle = data.len() / 2;
    if middle == 0 {
        return data.to_vec();
    }
    let half = middle as f64;

    let (port_sum, starboard_sum) = data
        .iter()
        .enumerate()
        .fold((0.0_f64, 0.0_f64), |(p, s), (c, &v)| {
            if c < middle { (p + v, s) } else { (p, s + v) }
        });
    let port_avg = port_sum / (half * params.normalization);
    let starboard_avg = starboard_sum / (half * params.normalization);

    let min_val = round2(params.min_value.clamp(0.0, 1.0));
    let max_val = round2((1.0 - min_val).min((min_val + params.window_value).max(0.0)));
    let stretch = min_val > 0.0 || max_val < 1.0;

    data.iter()
        .enumerate()
        .map(|(c, &sample)| {
            let (r, avg) = if c < middle {
                (c as f64 / half, port_avg)
            } else {
                (1.0 - (c - middle) as f64 / half, starboard_avg)
            };
            let gain = (30.0 * r.ln()).abs();
            let boosted = sample * 10_f64.powf(gain / params.tvg_gain);
            let v = boosted / avg;
            if stretch && v.is_finite() {
                (v - min_val) / (max_val - min_val)
            } else {
                v
            }
        })
        .collect()
}

/// Running per-sample-index mean of 8-bit intensities across pings.
///
/// Pings of different lengths are accepted; each index is averaged over
/// the pings that reach it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntensityAccumulator {
    sums: Vec<u64>,
    counts: Vec<u32>,
    pings: usize,
}

impl IntensityAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, samples: &[u8]) {
        if samples.len() > self.sums.len() {
            self.sums.resize(samples.len(), 0);
            self.counts.resize(samples.len(), 0);
        }
        for (i, &sample) in samples.iter().enumerate() {
            self.sums[i] += u64::from(sample);
            self.counts[i] += 1;
        }
        self.pings += 1;
    }

    /// Number of pings accumulated so far.
    #[must_use]
    pub fn ping_count(&self) -> usize {
        self.pings
    }

    /// Mean intensity per sample index.
    #[must_use]
    pub fn averages(&self) -> Vec<f64> {
        self.sums
            .iter()
            .zip(&self.counts)
            .map(|(&sum, &count)| {
                if count == 0 { 0.0 } else { sum as f64 / f64::from(count) }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_ping_without_gain_normalizes_to_normalization() {
        // tvg_gain -> infinity removes the gain; a flat ping then maps every
        // non-nadir sample to `normalization`.
        let params = CalibrationParams {
            normalization: 0.5,
            tvg_gain: f64::INFINITY,
            min_value: 0.0,
            window_value: 1.0,
        };
        let out = apply_normalization_and_tvg(&[4.0; 8], &params);
        assert_eq!(out.len(), 8);
        for v in &out[1..] {
            assert!((v - 0.5).abs() < 1e-12, "{out:?}");
        }
    }

    #[test]
    fn test_gain_grows_toward_outer_edges() {
        let params = CalibrationParams::default();
        let out = apply_normalization_and_tvg(&[10.0; 20], &params);
        // Port side: r grows with c, so the gain shrinks toward the middle.
        assert!(out[2] > out[8]);
        // Starboard side: r shrinks with c, so the gain grows toward the end.
        assert!(out[19] > out[11]);
        // Port nadir edge has r = 0 and infinite gain.
        assert!(out[0].is_infinite());
    }

    #[test]
    fn test_contrast_window_stretch() {
        let params = CalibrationParams {
            normalization: 1.0,
            tvg_gain: f64::INFINITY,
            min_value: 0.25,
            window_value: 0.5,
        };
        // Flat ping: every non-nadir value is exactly 1.0 before the stretch.
        let out = apply_normalization_and_tvg(&[2.0; 4], &params);
        // Window is [0.25, 0.75].
        assert!((out[1] - 1.5).abs() < 1e-12, "{out:?}");
    }

    #[test]
    fn test_short_input_is_returned_unchanged() {
        let params = CalibrationParams::default();
        assert!(apply_normalization_and_tvg(&[], &params).is_empty());
        assert_eq!(apply_normalization_and_tvg(&[3.0], &params), vec![3.0]);
    }

    #[test]
    fn test_accumulator_averages_per_index() {
        let mut acc = IntensityAccumulator::new();
        acc.accumulate(&[10, 20, 30]);
        acc.accumulate(&[30, 40]);
        assert_eq!(acc.ping_count(), 2);
        assert_eq!(acc.averages(), vec![20.0, 30.0, 30.0]);
        assert!(IntensityAccumulator::new().averages().is_empty());
    }

    #[test]
    fn test_params_from_toml() {
        let params: CalibrationParams = toml::from_str("tvg_gain = 150.0").expect("parse");
        assert_eq!(params.tvg_gain, 150.0);
        assert_eq!(params.normalization, 0.2);
    }
}
