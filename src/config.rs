//! Lab Configuration
//!
//! Defaults for every command, overridable through the environment (a `.env`
//! file is honoured by the binary) and then by command-line flags.

use serde::Serialize;
use tracing::warn;

/// Kernel orders accepted in kernel CSV files.
pub const DEFAULT_SIZES: [usize; 5] = [3, 5, 7, 9, 11];

/// Configuration for the kernel lab
#[derive(Debug, Clone, Serialize)]
pub struct LabConfig {
    /// Allowed kernel orders (`KERNEL_LAB_SIZES`, comma separated)
    pub sizes: Vec<usize>,
    /// Default condition number ceiling (`KERNEL_LAB_CEILING`)
    pub ceiling: f64,
    /// Number of histogram bins for distributions (`KERNEL_LAB_HISTOGRAM_BINS`)
    pub histogram_bins: usize,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            ceiling: 5.0,
            histogram_bins: 12,
        }
    }
}

impl LabConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; malformed values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("KERNEL_LAB_SIZES") {
            match parse_sizes(&raw) {
                Some(sizes) => config.sizes = sizes,
                None => warn!("Ignoring KERNEL_LAB_SIZES='{}'", raw),
            }
        }
        if let Some(raw) = lookup("KERNEL_LAB_CEILING") {
            match raw.trim().parse::<f64>() {
                Ok(c) if c >= 1.0 => config.ceiling = c,
                _ => warn!("Ignoring KERNEL_LAB_CEILING='{}' (must be a number >= 1)", raw),
            }
        }
        if let Some(raw) = lookup("KERNEL_LAB_HISTOGRAM_BINS") {
            match raw.trim().parse::<usize>() {
                Ok(b) if b > 0 => config.histogram_bins = b,
                _ => warn!("Ignoring KERNEL_LAB_HISTOGRAM_BINS='{}'", raw),
            }
        }
        config
    }
}

/// Parse `"3,5,7"`; every order must be at least 1.
pub fn parse_sizes(raw: &str) -> Option<Vec<usize>> {
    let sizes: Vec<usize> = raw
        .split(',')
        .map(|s| s.trim().parse::<usize>().ok().filter(|&n| n >= 1))
        .collect::<Option<_>>()?;
    if sizes.is_empty() {
        None
    } else {
        Some(sizes)
    }
}
