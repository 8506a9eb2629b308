use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ecg_prep_cli"))
}

/// Emit a single-channel format-16 WFDB pair.
fn write_wfdb(dir: &Path, record: &str, samples: &[i16]) {
    let hea = format!(
        "{record} 1 300 {}\n{record}.dat 16 200(0)/mV 16 0 0 0 0 ECG\n",
        samples.len()
    );
    fs::write(dir.join(format!("{record}.hea")), hea).expect("write hea");
    let mut dat = Vec::new();
    for sample in samples {
        dat.extend_from_slice(&sample.to_le_bytes());
    }
    fs::write(dir.join(format!("{record}.dat")), dat).expect("write dat");
}

struct Dataset {
    tmp: tempfile::TempDir,
    out_dir: PathBuf,
}

impl Dataset {
    /// Four WFDB-backed records labeled N, A, O, N.
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mat_dir = tmp.path().join("mat_files");
        let hea_dir = tmp.path().join("hea_files");
        fs::create_dir_all(&mat_dir).expect("mat dir");
        fs::create_dir_all(&hea_dir).expect("hea dir");

        let mut csv = String::new();
        for (i, label) in ["N", "A", "O", "N"].iter().enumerate() {
            let record = format!("A{:05}", i + 1);
            csv.push_str(&format!("{record},{label}\n"));
            let samples: Vec<i16> = (0..120)
                .map(|t| (((t as f32) * 0.4 + i as f32).sin() * 500.0) as i16)
                .collect();
            write_wfdb(&hea_dir, &record, &samples);
        }
        fs::write(tmp.path().join("REFERENCE.csv"), csv).expect("write reference");

        let out_dir = tmp.path().join("folds");
        Self { tmp, out_dir }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--reference".into(),
            self.tmp.path().join("REFERENCE.csv").display().to_string(),
            "--mat-dir".into(),
            self.tmp.path().join("mat_files").display().to_string(),
            "--hea-dir".into(),
            self.tmp.path().join("hea_files").display().to_string(),
            "--out-dir".into(),
            self.out_dir.display().to_string(),
        ]
    }
}

#[test]
fn plan_reports_deterministic_assignments() {
    let dataset = Dataset::new();

    let output = cli()
        .args(dataset.args())
        .arg("plan")
        .output()
        .expect("failed to run plan");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("plan JSON payload");
    assert_eq!(json["records"], 4);
    assert_eq!(json["n_folds"], 4);
    assert_eq!(json["seed"], 42);
    assert_eq!(json["assignments"].as_object().unwrap().len(), 4);

    // A second invocation must reproduce the identical payload.
    let again = cli()
        .args(dataset.args())
        .arg("plan")
        .output()
        .expect("failed to rerun plan");
    assert_eq!(stdout, String::from_utf8(again.stdout).expect("stdout UTF-8"));
}

#[test]
fn prepare_refuses_without_confirmation() {
    let dataset = Dataset::new();

    let output = cli()
        .args(dataset.args())
        .arg("prepare")
        .output()
        .expect("failed to run prepare");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("--yes"), "expected confirmation hint, got {stderr}");
    assert!(!dataset.out_dir.exists(), "unconfirmed prepare touched the tree");
}

#[test]
fn prepare_dry_run_writes_nothing() {
    let dataset = Dataset::new();

    let output = cli()
        .args(dataset.args())
        .args(["prepare", "--dry-run"])
        .output()
        .expect("failed to run dry-run");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("dry-run JSON payload");
    assert_eq!(json["records"], 4);
    assert!(!dataset.out_dir.exists(), "dry-run touched the tree");
}

#[test]
fn prepare_builds_the_fold_tree() {
    let dataset = Dataset::new();

    let output = cli()
        .args(dataset.args())
        .args(["prepare", "--yes"])
        .output()
        .expect("failed to run prepare");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("report JSON payload");
    assert_eq!(json["records"], 4);
    assert_eq!(json["test_counts"], serde_json::json!([1, 1, 1, 1]));
    assert_eq!(json["combined_counts"], serde_json::json!([3, 3, 3, 3]));

    // One test record per fold, three train records per combined dir.
    for fold in 0..4 {
        let fold_dir = dataset.out_dir.join(format!("fold{fold}"));
        assert!(fold_dir.join("data").join("0.npy").is_file());
        assert!(fold_dir.join("label").join("0.npy").is_file());

        let digits: String = (0..4).filter(|j| *j != fold).map(|j| j.to_string()).collect();
        let combined = dataset.out_dir.join(format!("fold{digits}"));
        for idx in 0..3 {
            assert!(combined.join("data").join(format!("{idx}.npy")).is_file());
            assert!(combined.join("label").join(format!("{idx}.npy")).is_file());
        }

        // Class subdirectories exist for every test fold.
        for class in ["AF", "normal", "other"] {
            assert!(fold_dir.join(class).join("data").is_dir());
            assert!(fold_dir.join(class).join("label").is_dir());
        }
    }
}

#[test]
fn prepare_with_custom_seed_still_partitions() {
    let dataset = Dataset::new();

    let output = cli()
        .args(dataset.args())
        .args(["--seed", "7", "prepare", "--yes"])
        .output()
        .expect("failed to run prepare");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("report JSON payload");
    assert_eq!(json["seed"], 7);
    assert_eq!(json["test_counts"], serde_json::json!([1, 1, 1, 1]));
}

#[test]
fn inspect_reports_source_and_stats() {
    let dataset = Dataset::new();

    let output = cli()
        .args(dataset.args())
        .args(["inspect", "--record", "A00002"])
        .output()
        .expect("failed to run inspect");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("inspect JSON payload");
    assert_eq!(json["record"], "A00002");
    assert_eq!(json["source"], "wfdb");
    assert_eq!(json["samples"], 120);
}

#[test]
fn inspect_unknown_record_fails() {
    let dataset = Dataset::new();

    let output = cli()
        .args(dataset.args())
        .args(["inspect", "--record", "A99999"])
        .output()
        .expect("failed to run inspect");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("A99999"), "expected record id in error, got {stderr}");
}
