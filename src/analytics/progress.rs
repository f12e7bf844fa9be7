use super::aggregate::StudentAggregates;
use super::ranking::{rank, total_population, RankedEntry};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    Up,
    Down,
    Stable,
}

impl Progress {
    fn from_change(change: i64) -> Self {
        match change {
            c if c > 0 => Progress::Up,
            c if c < 0 => Progress::Down,
            _ => Progress::Stable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub current_rank: usize,
    pub previous_rank: Option<usize>,
    pub current_total: f64,
    pub previous_total: Option<f64>,
    /// Positive means the student moved up (a smaller rank number).
    pub rank_change: i64,
    pub progress: Progress,
}

/// Ranks both exams independently and walks the current ranking. Students
/// missing from the previous ranking get `previous_rank = None` and are
/// reported as stable.
pub fn compare_progress(
    current: &StudentAggregates,
    previous: &StudentAggregates,
) -> Vec<ProgressEntry> {
    let current_ranked = rank(total_population(current));
    let previous_by_id: HashMap<String, RankedEntry> = rank(total_population(previous))
        .into_iter()
        .map(|e| (e.id.clone(), e))
        .collect();

    current_ranked
        .into_iter()
        .map(|cur| {
            let prev = previous_by_id.get(&cur.id);
            let rank_change = prev
                .map(|p| p.rank as i64 - cur.rank as i64)
                .unwrap_or(0);
            ProgressEntry {
                student_id: cur.id,
                student_name: cur.name,
                class_id: cur.class_id,
                current_rank: cur.rank,
                previous_rank: prev.map(|p| p.rank),
                current_total: cur.value,
                previous_total: prev.map(|p| p.value),
                rank_change,
                progress: Progress::from_change(rank_change),
            }
        })
        .collect()
}
