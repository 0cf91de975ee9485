//! Symmetry map of an image.

use anyhow::{Context, Result};

use super::SymmetryMapArgs;
use crate::analysis::Distribution;
use crate::io::SymmetryMap;

pub fn run(args: SymmetryMapArgs) -> Result<()> {
    let image = ::image::open(&args.input)
        .with_context(|| format!("Failed to open image {}", args.input.display()))?
        .into_luma8();
    let (width, height) = image.dimensions();

    let map = SymmetryMap::compute(&image)?;
    map.to_image()
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let (out_w, out_h) = map.dimensions();
    println!("🖼️  Original image {}x{}, symmetry map {}x{}", width, height, out_w, out_h);
    println!("💾 Symmetry map written to {}", args.output.display());

    if let Some(path) = &args.highlight {
        map.highlight(args.threshold)
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("💾 Mask (score >= {}) written to {}", args.threshold, path.display());
    }

    let scores: Vec<f64> = map.scores().iter().copied().collect();
    if let Some(dist) = Distribution::from_values(&scores) {
        println!("   Mean score:   {:.4}", dist.mean);
        println!("   Median score: {:.4}", dist.median);
    }
    println!("   Coverage at {}: {:.2}%", args.threshold, map.coverage(args.threshold) * 100.0);
    Ok(())
}
