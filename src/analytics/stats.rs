use serde::Serialize;
use std::cmp::Ordering;

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Nearest integer; halves round away from zero.
pub fn round_percent(x: f64) -> i64 {
    x.round() as i64
}

pub fn percent(count: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    round_percent(100.0 * (count as f64) / (total as f64))
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / (values.len() as f64)
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() as f64);
    var.sqrt()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

pub fn summarize(values: &[f64]) -> StatsSummary {
    if values.is_empty() {
        return StatsSummary::default();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    StatsSummary {
        count: values.len(),
        mean: round2(mean(values)),
        median: round2(median(values)),
        min: round2(min),
        max: round2(max),
        std_dev: round2(std_dev(values)),
    }
}
