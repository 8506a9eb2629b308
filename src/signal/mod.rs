//! Signal loader - dual-format record resolution
//!
//! A record identifier resolves to a source by existence checks, in strict
//! order: the MATLAB container first, then the WFDB pair, else not found.
//! The result is always a 1-D f32 waveform regardless of the source format
//! or its original dtype/shape.

use std::path::{Path, PathBuf};

use crate::error::SignalError;

pub mod mat;
pub mod wfdb;

/// Resolved storage location of a record's waveform
#[derive(Debug, Clone, PartialEq)]
pub enum SignalSource {
    /// MATLAB v5 container holding a `val` or `ecg` variable
    Matlab { mat: PathBuf },
    /// WFDB header/data pair
    Wfdb { hea: PathBuf, dat: PathBuf },
}

/// Resolve a record identifier to its source, if either format exists
pub fn resolve(mat_dir: &Path, hea_dir: &Path, record: &str) -> Option<SignalSource> {
    let mat = mat_dir.join(format!("{record}.mat"));
    if mat.exists() {
        return Some(SignalSource::Matlab { mat });
    }

    let dat = hea_dir.join(format!("{record}.dat"));
    if dat.exists() {
        let hea = hea_dir.join(format!("{record}.hea"));
        return Some(SignalSource::Wfdb { hea, dat });
    }

    None
}

/// Load a record's waveform as a 1-D f32 array
pub fn load_record(mat_dir: &Path, hea_dir: &Path, record: &str) -> Result<Vec<f32>, SignalError> {
    match resolve(mat_dir, hea_dir, record) {
        Some(SignalSource::Matlab { mat }) => mat::read_ecg(&mat),
        Some(SignalSource::Wfdb { hea, dat }) => wfdb::read_first_channel(&hea, &dat),
        None => Err(SignalError::RecordNotFound {
            record: record.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, bytes: &[u8]) {
        let mut file = std::fs::File::create(path).expect("create file");
        file.write_all(bytes).expect("write file");
    }

    fn minimal_wfdb(dir: &Path, record: &str, samples: &[i16]) {
        let hea = format!(
            "{record} 1 300 {}\n{record}.dat 16 1(0)/mV 16 0 0 0 0 ECG\n",
            samples.len()
        );
        write_file(&dir.join(format!("{record}.hea")), hea.as_bytes());
        let mut dat = Vec::new();
        for sample in samples {
            dat.extend_from_slice(&sample.to_le_bytes());
        }
        write_file(&dir.join(format!("{record}.dat")), &dat);
    }

    #[test]
    fn test_missing_record_names_identifier() {
        let mats = tempfile::tempdir().expect("tempdir");
        let heas = tempfile::tempdir().expect("tempdir");

        match load_record(mats.path(), heas.path(), "A00099").unwrap_err() {
            SignalError::RecordNotFound { record } => assert_eq!(record, "A00099"),
            other => panic!("Expected RecordNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_wfdb_fallback_when_mat_absent() {
        let mats = tempfile::tempdir().expect("tempdir");
        let heas = tempfile::tempdir().expect("tempdir");
        minimal_wfdb(heas.path(), "A00001", &[1, 2, 3]);

        assert!(matches!(
            resolve(mats.path(), heas.path(), "A00001"),
            Some(SignalSource::Wfdb { .. })
        ));
        let signal = load_record(mats.path(), heas.path(), "A00001").expect("load");
        assert_eq!(signal, vec![1.0f32, 2.0, 3.0]);
    }

    #[test]
    fn test_mat_takes_precedence_over_wfdb() {
        let mats = tempfile::tempdir().expect("tempdir");
        let heas = tempfile::tempdir().expect("tempdir");
        minimal_wfdb(heas.path(), "A00001", &[9, 9]);
        // An unparsable .mat file: precedence means the loader must pick it
        // and fail, not silently fall through to the WFDB pair.
        write_file(&mats.path().join("A00001.mat"), b"junk");

        assert!(matches!(
            resolve(mats.path(), heas.path(), "A00001"),
            Some(SignalSource::Matlab { .. })
        ));
        assert!(matches!(
            load_record(mats.path(), heas.path(), "A00001"),
            Err(SignalError::MatFormat { .. })
        ));
    }
}
