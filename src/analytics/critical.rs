use super::aggregate::StudentAggregates;
use super::model::{LineType, ScoreLine};
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_RANGE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalEntry {
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub total_score: f64,
    pub line_id: String,
    pub line_name: String,
    pub line_type: LineType,
    pub line_value: f64,
    pub distance: f64,
    pub position: Position,
}

/// One entry per (line, student) pair whose total lies within `range` of the
/// line, inclusive on both sides. The combined list is ordered by absolute
/// distance; equal distances keep line-then-student order.
pub fn find_critical(
    aggregates: &StudentAggregates,
    lines: &[ScoreLine],
    range: f64,
) -> Vec<CriticalEntry> {
    let mut out: Vec<CriticalEntry> = lines
        .iter()
        .flat_map(move |line| {
            aggregates
                .usable()
                .filter(move |s| {
                    s.total_score >= line.score_value - range
                        && s.total_score <= line.score_value + range
                })
                .map(move |s| {
                    let distance = s.total_score - line.score_value;
                    CriticalEntry {
                        student_id: s.student_id.clone(),
                        student_name: s.student_name.clone(),
                        class_id: s.class_id.clone(),
                        total_score: s.total_score,
                        line_id: line.id.clone(),
                        line_name: line.name.clone(),
                        line_type: line.line_type,
                        line_value: line.score_value,
                        distance,
                        position: if distance < 0.0 {
                            Position::Below
                        } else {
                            Position::Above
                        },
                    }
                })
        })
        .collect();
    out.sort_by(|a, b| {
        a.distance
            .abs()
            .partial_cmp(&b.distance.abs())
            .unwrap_or(Ordering::Equal)
    });
    out
}
