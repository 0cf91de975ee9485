//! Commands over whole kernel CSV files.

use std::io::{self, BufReader};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use super::{
    create, format_kernel, open, print_json, resolve_bins, resolve_ceiling, sizes_or_default, ConditionArgs,
    ConditionDistArgs, KernelCsvArgs, ReconditionArgs, ReconditionFormat, SymmetryArgs,
};
use crate::analysis::{condition_numbers, recondition_all, score_all, symmetry_score, Distribution, Histogram};
use crate::config::LabConfig;
use crate::io::{
    read_condition_numbers, read_kernels, write_condition_numbers, write_reconditioned, write_side_by_side, KernelBatch,
};
use crate::kernel::Kernel;

const BAR_WIDTH: usize = 40;

#[derive(Serialize)]
struct SymmetrySummary {
    order: usize,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean_kernel: Option<Kernel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<Distribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    histogram: Option<Histogram>,
}

#[derive(Serialize)]
struct DistributionSummary {
    distribution: Distribution,
    histogram: Histogram,
}

pub fn symmetry(args: SymmetryArgs, config: &LabConfig) -> Result<()> {
    let batch = load_kernels(&args.csv, config)?;
    let bins = resolve_bins(args.bins, config)?;
    let show_mean = !args.distribution;
    let show_distribution = !args.mean;

    let mut summary = SymmetrySummary {
        order: batch.order,
        count: batch.kernels.len(),
        mean_kernel: None,
        mean_score: None,
        distribution: None,
        histogram: None,
    };

    if show_mean {
        let mean = Kernel::mean_of(&batch.kernels).context("No kernels to average")?;
        summary.mean_score = Some(symmetry_score(&mean));
        summary.mean_kernel = Some(mean);
    }
    if show_distribution {
        let scores = score_all(&batch.kernels);
        summary.distribution = Distribution::from_values(&scores);
        summary.histogram = Histogram::new(&scores, bins);
    }

    if args.json {
        return print_json(&summary);
    }

    println!("📂 {} kernels of size {}x{}", summary.count, summary.order, summary.order);
    if let (Some(mean), Some(score)) = (&summary.mean_kernel, summary.mean_score) {
        println!("\n🧮 Mean {}x{} kernel:", summary.order, summary.order);
        print!("{}", format_kernel(mean));
        println!("✨ Symmetry score of mean kernel: {:.6}", score);
    }
    if let (Some(dist), Some(hist)) = (&summary.distribution, &summary.histogram) {
        println!("\n📊 Symmetry score distribution (n={})", dist.count);
        print_distribution(dist, hist);
    }
    Ok(())
}

pub fn recondition(args: ReconditionArgs, config: &LabConfig) -> Result<()> {
    let ceiling = resolve_ceiling(args.ceiling, config)?;
    let batch = load_kernels(&args.csv, config)?;
    let results = recondition_all(&batch.kernels, ceiling)?;

    let write = |out: &mut dyn io::Write| match args.format {
        ReconditionFormat::Report => write_reconditioned(out, &results),
        ReconditionFormat::SideBySide => write_side_by_side(out, &batch.kernels, &results, ceiling),
    };

    let adjusted = results.iter().filter(|r| r.adjusted).count();
    match &args.output {
        Some(path) => {
            write(&mut create(path)?)?;
            println!(
                "✅ {} of {} kernels reconditioned (C = {}), written to {}",
                adjusted,
                results.len(),
                ceiling,
                path.display()
            );
        }
        None => write(&mut io::stdout().lock())?,
    }
    Ok(())
}

pub fn condition(args: ConditionArgs, config: &LabConfig) -> Result<()> {
    let batch = load_kernels(&args.csv, config)?;
    let conds = condition_numbers(&batch.kernels)?;

    match &args.output {
        Some(path) => {
            write_condition_numbers(create(path)?, &conds)?;
            println!("✅ {} condition numbers written to {}", conds.len(), path.display());
        }
        None => write_condition_numbers(io::stdout().lock(), &conds)?,
    }
    Ok(())
}

pub fn condition_dist(args: ConditionDistArgs, config: &LabConfig) -> Result<()> {
    let bins = resolve_bins(args.bins, config)?;
    let file = open(&args.input)?;
    let conds = read_condition_numbers(BufReader::new(file))
        .with_context(|| format!("Failed to read condition numbers from {}", args.input.display()))?;

    let distribution = Distribution::from_values(&conds).context("No finite condition numbers to plot")?;
    let histogram = Histogram::new(&conds, bins).context("No finite condition numbers to plot")?;
    let summary = DistributionSummary { distribution, histogram };

    if args.json {
        return print_json(&summary);
    }
    println!("📊 Condition number distribution (n={})", summary.distribution.count);
    print_distribution(&summary.distribution, &summary.histogram);
    Ok(())
}

fn load_kernels(args: &KernelCsvArgs, config: &LabConfig) -> Result<KernelBatch> {
    let sizes = sizes_or_default(&args.sizes, config);
    let file = open(&args.input)?;
    let batch = read_kernels(BufReader::new(file), &sizes)
        .with_context(|| format!("Failed to read kernels from {}", args.input.display()))?;
    info!("Loaded {} kernels from {}", batch.kernels.len(), args.input.display());
    Ok(batch)
}

fn print_distribution(dist: &Distribution, hist: &Histogram) {
    println!("   Mean:   {:.4}", dist.mean);
    println!("   Median: {:.4}", dist.median);
    println!("   Range:  {:.4} .. {:.4}", dist.min, dist.max);
    if dist.non_finite > 0 {
        println!("   ⚠️  {} non-finite values skipped", dist.non_finite);
    }
    println!("{}", hist.render(BAR_WIDTH));
}
