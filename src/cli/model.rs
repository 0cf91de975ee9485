//! Layer inspection and kernel export.

use anyhow::{bail, Context, Result};
use serde::Serialize;

use super::{create, print_json, sizes_or_default, InspectArgs};
use crate::config::LabConfig;
use crate::io::write_kernels;
use crate::model::{KernelDims, KernelLayout, LayerStatus, LayerSummary, WeightFile};

#[derive(Serialize)]
struct Inspection<'a> {
    sizes: &'a [usize],
    layers: Vec<&'a LayerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exported: Option<Export>,
}

#[derive(Serialize)]
struct Export {
    layer: usize,
    path: String,
    kernels: usize,
}

pub fn inspect(args: InspectArgs, config: &LabConfig) -> Result<()> {
    let sizes = sizes_or_default(&args.sizes, config);
    let layout = args.layout.map(KernelLayout::from);
    let weights = WeightFile::open(&args.weights)
        .with_context(|| format!("Failed to load weight file {}", args.weights.display()))?;
    let layers = weights.layers(&sizes, layout)?;

    let shown: Vec<&LayerSummary> = layers
        .iter()
        .filter(|l| args.all || l.status == LayerStatus::Matched)
        .collect();

    let exported = match &args.export {
        Some(selector) => Some(export(&weights, &layers, selector, layout, &args)?),
        None => None,
    };

    if args.json {
        return print_json(&Inspection { sizes: &sizes, layers: shown, exported });
    }

    if args.all {
        println!("📦 All layers ({})", layers.len());
    } else {
        println!("📦 Matched convolution layers ({}), sizes {:?}", shown.len(), sizes);
    }
    println!("{}", "═".repeat(88));
    println!(
        "{:>5}  {:<36} {:>6} {:>6} {:>8} {:>8} {:>8}  {}",
        "index", "layer", "h", "w", "in", "out", "matrices", "status"
    );
    println!("{}", "─".repeat(88));
    for layer in &shown {
        let dims = |f: fn(&KernelDims) -> usize| {
            layer.dims.as_ref().map(f).map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{:>5}  {:<36} {:>6} {:>6} {:>8} {:>8} {:>8}  {}",
            layer.index,
            layer.name,
            dims(|d| d.height),
            dims(|d| d.width),
            dims(|d| d.in_channels),
            dims(|d| d.out_channels),
            layer.num_matrices,
            layer.status
        );
    }

    if let Some(export) = exported {
        println!("\n💾 Wrote {} kernels of layer #{} to {}", export.kernels, export.layer, export.path);
    }
    Ok(())
}

fn export(
    weights: &WeightFile,
    layers: &[LayerSummary],
    selector: &str,
    layout: Option<KernelLayout>,
    args: &InspectArgs,
) -> Result<Export> {
    let layer = match selector.parse::<usize>() {
        Ok(index) => layers.get(index),
        Err(_) => layers.iter().find(|l| l.name == selector),
    }
    .with_context(|| format!("No layer '{}' in {}", selector, args.weights.display()))?;

    if !layer.is_selectable() {
        bail!("Layer #{} '{}' holds no convolution kernels", layer.index, layer.name);
    }
    let file_name = layer.export_file_name().context("Layer has no kernel dimensions")?;
    let kernels = weights.kernels(&layer.name, layout)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let path = args.out_dir.join(file_name);
    write_kernels(create(&path)?, &kernels)?;

    Ok(Export { layer: layer.index, path: path.display().to_string(), kernels: kernels.len() })
}
