// Amplitude normalization - second stage of the per-record pipeline
//
// Centers the conditioned waveform on its median and rescales to unit
// max-absolute amplitude, so every persisted record occupies the same
// [-1, 1] range regardless of acquisition gain.

/// Normalize a conditioned waveform
///
/// Pure function; empty input passes through unchanged. An all-constant
/// signal centers to zero and is returned without rescaling.
pub fn normalization_processing(signal: &[f32]) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }

    let center = median(signal);
    let centered: Vec<f32> = signal.iter().map(|&sample| sample - center).collect();

    let peak = centered
        .iter()
        .fold(0.0f32, |acc, &sample| acc.max(sample.abs()));
    if peak < 1e-6 {
        return centered;
    }

    centered.iter().map(|&sample| sample / peak).collect()
}

fn median(signal: &[f32]) -> f32 {
    let mut sorted = signal.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted[sorted.len() / 2]
}
