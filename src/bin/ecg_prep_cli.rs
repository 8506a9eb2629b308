use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ecg_prep::config::PrepConfig;
use ecg_prep::folds::FoldPlan;
use ecg_prep::reference::RecordEntry;
use ecg_prep::runner::PrepRunner;
use ecg_prep::signal::{self, SignalSource};

#[derive(Parser, Debug)]
#[command(
    name = "ecg_prep_cli",
    about = "Cross-validation fold builder for labeled ECG records"
)]
struct Cli {
    /// Optional JSON config file; individual flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Commands,
}

/// Per-field overrides of the loaded configuration
#[derive(Args, Debug)]
struct Overrides {
    /// Headerless reference CSV (record identifier, label)
    #[arg(long)]
    reference: Option<PathBuf>,
    /// Directory of MATLAB .mat signal containers
    #[arg(long)]
    mat_dir: Option<PathBuf>,
    /// Directory of WFDB .hea/.dat pairs
    #[arg(long)]
    hea_dir: Option<PathBuf>,
    /// Root of the generated fold tree
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Number of test folds
    #[arg(long)]
    folds: Option<usize>,
    /// Shuffle seed for the fold assignment
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full preparation (destroys and rebuilds the output tree)
    Prepare {
        /// Confirm the destructive reset of the output tree
        #[arg(long)]
        yes: bool,
        /// Print the fold plan without touching the filesystem
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the deterministic fold assignment as JSON
    Plan,
    /// Load and process a single record, printing summary stats
    Inspect {
        #[arg(long)]
        record: String,
    },
}

fn main() -> ExitCode {
    // Keep stdout reserved for JSON payloads; logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = build_config(cli.config.as_deref(), &cli.overrides);
    let runner = PrepRunner::new(config);

    match cli.command {
        Commands::Prepare { yes, dry_run } => run_prepare(&runner, yes, dry_run),
        Commands::Plan => run_plan(&runner),
        Commands::Inspect { record } => run_inspect(&runner, &record),
    }
}

fn build_config(config_path: Option<&Path>, overrides: &Overrides) -> PrepConfig {
    let mut config = match config_path {
        Some(path) => PrepConfig::load_from_file(path),
        None => PrepConfig::default(),
    };
    if let Some(path) = &overrides.reference {
        config.inputs.reference_csv = path.clone();
    }
    if let Some(path) = &overrides.mat_dir {
        config.inputs.mat_dir = path.clone();
    }
    if let Some(path) = &overrides.hea_dir {
        config.inputs.hea_dir = path.clone();
    }
    if let Some(path) = &overrides.out_dir {
        config.output.root = path.clone();
    }
    if let Some(folds) = overrides.folds {
        config.folds.n_folds = folds;
    }
    if let Some(seed) = overrides.seed {
        config.folds.seed = seed;
    }
    config
}

fn run_prepare(runner: &PrepRunner, yes: bool, dry_run: bool) -> Result<ExitCode> {
    if dry_run {
        let (entries, plan) = runner.plan()?;
        println!("{}", serde_json::to_string_pretty(&plan_payload(&entries, &plan))?);
        return Ok(ExitCode::from(0));
    }

    if !yes {
        eprintln!(
            "Refusing to destroy output tree '{}' without --yes (use --dry-run to preview)",
            runner.config().output.root.display()
        );
        return Ok(ExitCode::from(2));
    }

    let report = runner.run()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_plan(runner: &PrepRunner) -> Result<ExitCode> {
    let (entries, plan) = runner.plan()?;
    println!("{}", serde_json::to_string_pretty(&plan_payload(&entries, &plan))?);
    Ok(ExitCode::from(0))
}

fn run_inspect(runner: &PrepRunner, record: &str) -> Result<ExitCode> {
    let inputs = &runner.config().inputs;
    let source = match signal::resolve(&inputs.mat_dir, &inputs.hea_dir, record) {
        Some(SignalSource::Matlab { .. }) => "matlab",
        Some(SignalSource::Wfdb { .. }) => "wfdb",
        None => "missing",
    };
    let processed = runner.load_and_process(record)?;

    let min = processed.iter().copied().fold(f32::INFINITY, f32::min);
    let max = processed.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "record": record,
            "source": source,
            "samples": processed.len(),
            "min": min,
            "max": max,
        }))?
    );
    Ok(ExitCode::from(0))
}

fn plan_payload(entries: &[RecordEntry], plan: &FoldPlan) -> serde_json::Value {
    let assignments: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .filter_map(|entry| {
            plan.fold_of(&entry.id)
                .map(|fold| (entry.id.clone(), serde_json::json!(fold)))
        })
        .collect();
    let test_counts: Vec<usize> = (0..plan.n_folds())
        .map(|fold| plan.test_records(fold).len())
        .collect();

    serde_json::json!({
        "records": entries.len(),
        "n_folds": plan.n_folds(),
        "seed": plan.seed(),
        "test_counts": test_counts,
        "assignments": assignments,
    })
}
