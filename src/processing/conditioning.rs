// Signal conditioning - baseline removal and spike clipping
//
// First stage of the per-record pipeline. ECG traces carry slow baseline
// wander (electrode drift, respiration) under the waveform; a centered
// moving-average detrend removes it. Isolated electrode-pop spikes are then
// clipped to a robust amplitude envelope so they cannot dominate the
// normalization stage.

/// Width of the centered moving-average baseline window, in samples
const BASELINE_WINDOW: usize = 129;

/// Spike threshold as a multiple of the median absolute deviation
const SPIKE_MAD_MULTIPLIER: f32 = 8.0;

/// Condition a raw waveform: detrend, then clip spikes
///
/// Pure function; empty input passes through unchanged.
pub fn signal_processing(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let detrended = remove_baseline(raw, BASELINE_WINDOW);
    clip_spikes(&detrended)
}

/// Subtract a centered moving average from the signal
///
/// The window is clamped at the edges, so the first and last samples are
/// detrended against shorter one-sided means.
fn remove_baseline(signal: &[f32], window: usize) -> Vec<f32> {
    let half = (window / 2).max(1);

    // Prefix sums make each windowed mean O(1).
    let mut prefix = Vec::with_capacity(signal.len() + 1);
    prefix.push(0.0f64);
    for &sample in signal {
        prefix.push(prefix[prefix.len() - 1] + f64::from(sample));
    }

    signal
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(signal.len());
            let mean = (prefix[hi] - prefix[lo]) / (hi - lo) as f64;
            sample - mean as f32
        })
        .collect()
}

/// Clamp samples beyond a robust amplitude threshold
fn clip_spikes(signal: &[f32]) -> Vec<f32> {
    let mad = median_absolute(signal);
    if mad < 1e-6 {
        return signal.to_vec();
    }

    let threshold = SPIKE_MAD_MULTIPLIER * mad;
    signal
        .iter()
        .map(|&sample| sample.clamp(-threshold, threshold))
        .collect()
}

/// Median of absolute sample values
fn median_absolute(signal: &[f32]) -> f32 {
    let mut magnitudes: Vec<f32> = signal.iter().map(|&sample| sample.abs()).collect();
    magnitudes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    magnitudes.get(magnitudes.len() / 2).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_passthrough() {
        assert!(signal_processing(&[]).is_empty());
    }

    #[test]
    fn test_removes_constant_offset() {
        let raw = vec![5.0f32; 500];
        let conditioned = signal_processing(&raw);
        for sample in conditioned {
            assert!(sample.abs() < 1e-4, "offset not removed: {sample}");
        }
    }

    #[test]
    fn test_preserves_fast_oscillation() {
        // A fast alternating signal has zero local mean, so detrending
        // should leave it essentially untouched.
        let raw: Vec<f32> = (0..512).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let detrended = remove_baseline(&raw, BASELINE_WINDOW);
        for (idx, (&a, &b)) in raw.iter().zip(detrended.iter()).enumerate() {
            // Edge windows are asymmetric, so allow slack there.
            if idx > 64 && idx < 448 {
                assert!((a - b).abs() < 0.05, "sample {idx}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_clips_isolated_spike() {
        let mut raw: Vec<f32> = (0..512)
            .map(|i| (i as f32 * 0.3).sin())
            .collect();
        raw[100] = 500.0;

        let conditioned = signal_processing(&raw);
        let peak = conditioned
            .iter()
            .fold(0.0f32, |acc, &sample| acc.max(sample.abs()));
        assert!(peak < 50.0, "spike survived conditioning: {peak}");
    }

    #[test]
    fn test_output_length_matches_input() {
        let raw: Vec<f32> = (0..777).map(|i| i as f32).collect();
        assert_eq!(signal_processing(&raw).len(), raw.len());
    }
}
