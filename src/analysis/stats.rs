//! Distribution summaries for batches of scores and condition numbers.

use serde::Serialize;
use tracing::warn;

/// Summary of the finite values in a sample.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// NaN or infinite inputs left out of every statistic.
    pub non_finite: usize,
}

impl Distribution {
    /// `None` when there is no finite value to summarise.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let non_finite = values.len() - finite.len();
        if non_finite > 0 {
            warn!("Skipping {} non-finite values out of {}", non_finite, values.len());
        }
        if finite.is_empty() {
            return None;
        }
        finite.sort_by(f64::total_cmp);

        let count = finite.len();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            0.5 * (finite[mid - 1] + finite[mid])
        } else {
            finite[mid]
        };

        Some(Self {
            count,
            mean: finite.iter().sum::<f64>() / count as f64,
            median,
            min: finite[0],
            max: finite[count - 1],
            non_finite,
        })
    }
}

/// Equal-width histogram over `[min, max]`; the last bin is closed on the right.
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bins the finite values. Returns `None` for `bins == 0` or no finite values.
    pub fn new(values: &[f64], bins: usize) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if bins == 0 || finite.is_empty() {
            return None;
        }

        let (mut lo, mut hi) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { hi } else { lo + width * i as f64 })
            .collect();

        let mut counts = vec![0usize; bins];
        for v in finite {
            let bin = (((v - lo) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Some(Self { edges, counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(lower, upper, count)` for each bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }

    /// Text bar chart, one bin per line, bars scaled to `width` characters.
    pub fn render(&self, width: usize) -> String {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        self.bins()
            .map(|(lo, hi, count)| {
                let bar = "█".repeat(count * width / peak);
                format!("{:>10.2}-{:<10.2} | {:>6} {}", lo, hi, count, bar)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
