//! Small numeric helpers shared by the comparators.

use std::collections::BTreeMap;

use synthvae_core::Value;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - ddof) as f64).sqrt())
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, value| match acc {
        None => Some((*value, *value)),
        Some((lo, hi)) => Some((lo.min(*value), hi.max(*value))),
    })
}

/// Evenly spaced points over `[start, end]`.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points).map(|idx| start + step * idx as f64).collect()
        }
    }
}

/// Scott's rule bandwidth; `None` when the sample has no spread.
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let std = std_dev(values, 1)?;
    if std <= 0.0 || !std.is_finite() {
        return None;
    }
    Some(std * (values.len() as f64).powf(-0.2))
}

/// Gaussian kernel density estimate evaluated on `grid`.
pub fn gaussian_kde(values: &[f64], bandwidth: f64, grid: &[f64]) -> Vec<f64> {
    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|x| {
            values
                .iter()
                .map(|value| {
                    let z = (x - value) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// Five-number summary with 1.5 IQR whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|value| *value >= low_fence && *value <= high_fence)
            .collect();
        let whisker_low = inside.first().copied().unwrap_or(q1);
        let whisker_high = inside.last().copied().unwrap_or(q3);
        let outliers = sorted
            .into_iter()
            .filter(|value| *value < low_fence || *value > high_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    pub fn low(&self) -> f64 {
        self.outliers
            .iter()
            .copied()
            .fold(self.whisker_low, f64::min)
    }

    pub fn high(&self) -> f64 {
        self.outliers
            .iter()
            .copied()
            .fold(self.whisker_high, f64::max)
    }
}

/// Bin counts over `bins` equal-width bins spanning `[lo, hi]`.
pub fn histogram(values: &[f64], bins: usize, lo: f64, hi: f64) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    let width = (hi - lo) / bins as f64;
    for value in values {
        let idx = if width > 0.0 {
            ((value - lo) / width).floor() as isize
        } else {
            0
        };
        let idx = idx.clamp(0, bins as isize - 1) as usize;
        counts[idx] += 1;
    }
    counts
}

/// Running sum in row order, skipping missing cells.
pub fn cumulative_sum(values: &[Value]) -> Vec<(f64, f64)> {
    let mut total = 0.0;
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            value.as_f64().map(|value| {
                total += value;
                (idx as f64, total)
            })
        })
        .collect()
}

/// Non-missing category labels with their counts, sorted by label.
pub fn value_counts(values: &[Value]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values.iter().filter(|value| !value.is_missing()) {
        *counts.entry(value.label()).or_insert(0) += 1;
    }
    counts
}

/// Most frequent label; ties go to the smallest label.
pub fn mode(counts: &BTreeMap<String, usize>) -> Option<(&str, usize)> {
    counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, (label, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((label.as_str(), *count)),
        })
}
