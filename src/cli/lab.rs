//! Sandbox commands for a single kernel.

use std::io::Read;

use anyhow::{Context, Result};

use super::{format_kernel, format_sigma, open, print_json, resolve_ceiling, AnalysisArgs, InputArgs, RandomArgs};
use crate::config::LabConfig;
use crate::io::{parse_matrix, parse_matrix_of_order};
use crate::kernel::Kernel;
use crate::lab::{analyze, random_kernel, seeded_rng, KernelReport};

pub fn random(args: RandomArgs, config: &LabConfig) -> Result<()> {
    let ceiling = resolve_ceiling(args.analysis.ceiling, config)?;
    let mut rng = seeded_rng(args.seed);
    let kernel = random_kernel(args.size, args.mean, args.std_dev, &mut rng)?;

    if !args.analysis.json {
        println!(
            "🎲 Random {}x{} kernel ~ N({}, {}²), seed {}",
            args.size, args.size, args.mean, args.std_dev, args.seed
        );
    }
    report(kernel, ceiling, &args.analysis)
}

pub fn input(args: InputArgs, config: &LabConfig) -> Result<()> {
    let ceiling = resolve_ceiling(args.analysis.ceiling, config)?;

    let mut text = String::new();
    match &args.file {
        Some(path) => open(path)?.read_to_string(&mut text),
        None => std::io::stdin().read_to_string(&mut text),
    }
    .context("Failed to read matrix text")?;

    let kernel = match args.size {
        Some(order) => parse_matrix_of_order(&text, order),
        None => parse_matrix(&text),
    }
    .context("Failed to parse matrix")?;

    if !args.analysis.json {
        println!("⌨️  Input {}x{} kernel", kernel.order(), kernel.order());
    }
    report(kernel, ceiling, &args.analysis)
}

fn report(kernel: Kernel, ceiling: f64, args: &AnalysisArgs) -> Result<()> {
    let mut report = analyze(kernel, ceiling)?;
    if args.profile {
        report = report.with_profile();
    }
    if args.json {
        return print_json(&report);
    }
    print_report(&report, ceiling);
    Ok(())
}

fn print_report(report: &KernelReport, ceiling: f64) {
    println!("\n📥 Input kernel:");
    print!("{}", format_kernel(&report.input));
    println!("\n📤 Output (reconditioned) kernel:");
    print!("{}", format_kernel(&report.output));

    println!("\n{}", "─".repeat(60));
    if report.adjusted {
        println!("🔧 Reconditioned to C = {}", ceiling);
    } else {
        println!("✅ Already within C = {}, kernel unchanged", ceiling);
    }
    println!("   Frobenius distance ‖K−Kʳᵉᶜ‖: {:.6e}", report.distance);
    println!("   Condition number (before):   {:.6}", report.condition_before);
    println!("   Condition number (after):    {:.6}", report.condition_after);
    println!("   Symmetry score (before):     {:.4}", report.score_before);
    println!("   Symmetry score (after):      {:.4}", report.score_after);

    println!("\n📐 Singular values");
    println!("   Before: {}", format_sigma(&report.sigma_before));
    println!("   After:  {}", format_sigma(&report.sigma_after));

    if let Some(profile) = &report.profile {
        println!("\n🔁 Distance under each transformation (normalized input)");
        for (transformation, distance) in &profile.distances {
            println!("   {:<24} {:.6}", transformation.name(), distance);
        }
    }
}
