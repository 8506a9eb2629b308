//! Processing pipeline applied to every record before persistence
//!
//! Two transforms in fixed order: signal conditioning, then amplitude
//! normalization. Both are pure `&[f32] -> Vec<f32>` collaborators; the
//! order is this module's contract.

pub mod conditioning;
pub mod normalize;

pub use conditioning::signal_processing;
pub use normalize::normalization_processing;

/// Run the full pipeline on a raw waveform
pub fn run(raw: &[f32]) -> Vec<f32> {
    normalization_processing(&signal_processing(raw))
}
