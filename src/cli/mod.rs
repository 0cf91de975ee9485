//! Kernel Lab CLI
//!
//! Command-line surface of the lab. Every command reads its defaults from
//! [`LabConfig`] and lets flags override them.
//!
//! # Usage
//!
//! ```bash
//! # List the convolution layers of a weight file and export one of them
//! kernel_lab inspect model.safetensors --export 3 --out-dir kernels/
//!
//! # Mean kernel and score distribution of a kernel CSV
//! kernel_lab symmetry kernels/layer003_conv2_3x3.csv
//!
//! # Cap condition numbers at 5 and write the result
//! kernel_lab recondition kernels.csv --ceiling 5 --output reconditioned.csv
//!
//! # Sandbox
//! kernel_lab random --size 5 --seed 42
//! echo "1 2\n3 4" | kernel_lab input
//! ```

mod batch;
mod lab;
mod model;
mod symmetry_map;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::LabConfig;
use crate::kernel::Kernel;
use crate::model::KernelLayout;

/// Symmetry scoring and condition-number reconditioning for square kernels
#[derive(Parser, Debug)]
#[command(name = "kernel_lab")]
#[command(author, version, about = "Inspect and recondition convolution kernels")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the layers of a .safetensors weight file and export kernels
    Inspect(InspectArgs),

    /// Mean kernel and symmetry score distribution of a kernel CSV
    Symmetry(SymmetryArgs),

    /// Cap the condition number of every kernel in a CSV
    Recondition(ReconditionArgs),

    /// Condition number of every kernel in a CSV
    Condition(ConditionArgs),

    /// Distribution of a single-column CSV of condition numbers
    ConditionDist(ConditionDistArgs),

    /// Generate a random kernel and analyze it
    Random(RandomArgs),

    /// Analyze a kernel typed on stdin or read from a text file
    Input(InputArgs),

    /// Symmetry score of every 3x3 neighbourhood of a grayscale image
    SymmetryMap(SymmetryMapArgs),
}

/// Options shared by commands that read a kernel CSV
#[derive(Args, Debug)]
pub struct KernelCsvArgs {
    /// Headerless CSV, one flattened n×n kernel per row
    pub input: PathBuf,

    /// Accepted kernel orders, comma separated (default from config)
    #[arg(long, value_delimiter = ',')]
    pub sizes: Vec<usize>,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Weight file in .safetensors format
    pub weights: PathBuf,

    /// Kernel sizes counted as matched, comma separated (default from config)
    #[arg(long, value_delimiter = ',')]
    pub sizes: Vec<usize>,

    /// Show every tensor, not only matched layers
    #[arg(short, long)]
    pub all: bool,

    /// Force the axis order of 4-D tensors instead of guessing it
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Export the kernels of one layer (index or tensor name) to CSV
    #[arg(short, long)]
    pub export: Option<String>,

    /// Directory for exported CSV files
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Weight tensor layout for CLI
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LayoutArg {
    /// (height, width, in, out), Keras style
    Hwio,
    /// (out, in, height, width), PyTorch style
    Oihw,
}

impl From<LayoutArg> for KernelLayout {
    fn from(val: LayoutArg) -> Self {
        match val {
            LayoutArg::Hwio => KernelLayout::Hwio,
            LayoutArg::Oihw => KernelLayout::Oihw,
        }
    }
}

/// Arguments for the symmetry command
#[derive(Args, Debug)]
pub struct SymmetryArgs {
    #[command(flatten)]
    pub csv: KernelCsvArgs,

    /// Only show the mean kernel and its score
    #[arg(long, conflicts_with = "distribution")]
    pub mean: bool,

    /// Only show the score distribution
    #[arg(long)]
    pub distribution: bool,

    /// Histogram bins (default from config)
    #[arg(long)]
    pub bins: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the recondition command
#[derive(Args, Debug)]
pub struct ReconditionArgs {
    #[command(flatten)]
    pub csv: KernelCsvArgs,

    /// Maximum allowed condition number (default from config)
    #[arg(short, long)]
    pub ceiling: Option<f64>,

    /// Output CSV (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Layout of the output rows
    #[arg(long, value_enum, default_value_t = ReconditionFormat::Report)]
    pub format: ReconditionFormat,
}

/// Row layout of the recondition output
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconditionFormat {
    /// Header row, repaired values, condition_number, status
    Report,
    /// No header: original values, condition_number, higher/lower_or_equal, repaired values
    SideBySide,
}

/// Arguments for the condition command
#[derive(Args, Debug)]
pub struct ConditionArgs {
    #[command(flatten)]
    pub csv: KernelCsvArgs,

    /// Output CSV (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the condition-dist command
#[derive(Args, Debug)]
pub struct ConditionDistArgs {
    /// CSV with a header and exactly one column of condition numbers
    pub input: PathBuf,

    /// Histogram bins (default from config)
    #[arg(long)]
    pub bins: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Options shared by the sandbox commands
#[derive(Args, Debug)]
pub struct AnalysisArgs {
    /// Maximum allowed condition number (default from config)
    #[arg(short, long)]
    pub ceiling: Option<f64>,

    /// Also list the distance under each transformation
    #[arg(long)]
    pub profile: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the random command
#[derive(Args, Debug)]
pub struct RandomArgs {
    /// Kernel order
    #[arg(short, long, default_value = "3")]
    pub size: usize,

    /// Mean of the normal distribution
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub mean: f64,

    /// Standard deviation of the normal distribution
    #[arg(long, default_value = "1.0")]
    pub std_dev: f64,

    /// Random seed
    #[arg(long, default_value = "0")]
    pub seed: u64,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Arguments for the input command
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Text file with one row per line (stdin if omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Require the matrix to be size×size
    #[arg(short, long)]
    pub size: Option<usize>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Arguments for the symmetry-map command
#[derive(Args, Debug)]
pub struct SymmetryMapArgs {
    /// Input image (converted to grayscale)
    pub input: PathBuf,

    /// Output PNG
    #[arg(short, long, default_value = "symmetry_map.png")]
    pub output: PathBuf,

    /// Also write a black/white mask of pixels scoring at least --threshold
    #[arg(long)]
    pub highlight: Option<PathBuf>,

    /// Score threshold for the mask and the coverage figure
    #[arg(short, long, default_value = "0.9")]
    pub threshold: f64,
}

/// Run one command.
pub fn execute(command: Commands, config: &LabConfig) -> Result<()> {
    match command {
        Commands::Inspect(args) => model::inspect(args, config),
        Commands::Symmetry(args) => batch::symmetry(args, config),
        Commands::Recondition(args) => batch::recondition(args, config),
        Commands::Condition(args) => batch::condition(args, config),
        Commands::ConditionDist(args) => batch::condition_dist(args, config),
        Commands::Random(args) => lab::random(args, config),
        Commands::Input(args) => lab::input(args, config),
        Commands::SymmetryMap(args) => symmetry_map::run(args),
    }
}

fn sizes_or_default(sizes: &[usize], config: &LabConfig) -> Vec<usize> {
    if sizes.is_empty() {
        config.sizes.clone()
    } else {
        sizes.to_vec()
    }
}

fn resolve_ceiling(ceiling: Option<f64>, config: &LabConfig) -> Result<f64> {
    let ceiling = ceiling.unwrap_or(config.ceiling);
    if !(ceiling >= 1.0) {
        bail!("Condition number ceiling must be >= 1, got {}", ceiling);
    }
    Ok(ceiling)
}

fn resolve_bins(bins: Option<usize>, config: &LabConfig) -> Result<usize> {
    match bins.unwrap_or(config.histogram_bins) {
        0 => bail!("Histogram needs at least one bin"),
        b => Ok(b),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_kernel(kernel: &Kernel) -> String {
    kernel
        .view()
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| format!("{:>12.6}", v)).collect::<String>() + "\n")
        .collect()
}

fn format_sigma(sigma: &[f64]) -> String {
    let values: Vec<String> = sigma.iter().map(|s| format!("{:.6}", s)).collect();
    format!("[{}]", values.join(", "))
}
