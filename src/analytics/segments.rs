use super::stats::percent;
use super::thresholds::SegmentThresholds;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Segment {
    Excellent,
    Good,
    Pass,
    Fail,
}

impl Segment {
    /// Half-open buckets evaluated top-down; `fail_max` is informational only.
    pub fn of(score: f64, t: &SegmentThresholds) -> Self {
        if score >= t.excellent_min {
            Segment::Excellent
        } else if score >= t.good_min {
            Segment::Good
        } else if score >= t.pass_min {
            Segment::Pass
        } else {
            Segment::Fail
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPercentages {
    pub excellent: i64,
    pub good: i64,
    pub pass: i64,
    pub fail: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDistribution {
    pub excellent_count: usize,
    pub good_count: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub total: usize,
    pub percentages: SegmentPercentages,
}

pub fn classify(scores: &[f64], thresholds: &SegmentThresholds) -> SegmentDistribution {
    let mut d = SegmentDistribution {
        total: scores.len(),
        ..SegmentDistribution::default()
    };
    for &score in scores {
        match Segment::of(score, thresholds) {
            Segment::Excellent => d.excellent_count += 1,
            Segment::Good => d.good_count += 1,
            Segment::Pass => d.pass_count += 1,
            Segment::Fail => d.fail_count += 1,
        }
    }
    d.percentages = SegmentPercentages {
        excellent: percent(d.excellent_count, d.total),
        good: percent(d.good_count, d.total),
        pass: percent(d.pass_count, d.total),
        fail: percent(d.fail_count, d.total),
    };
    d
}
