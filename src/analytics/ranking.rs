use super::aggregate::StudentAggregates;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct RankInput {
    pub id: String,
    pub name: String,
    pub class_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(rename = "studentId")]
    pub id: String,
    #[serde(rename = "studentName")]
    pub name: String,
    pub class_id: String,
    pub value: f64,
}

/// Sorts descending by value and numbers entries `1..=n` by position.
///
/// Ties are not shared: equal values keep their encounter order and still get
/// consecutive ranks.
pub fn rank(mut population: Vec<RankInput>) -> Vec<RankedEntry> {
    // `sort_by` is stable, which is what keeps tied entries in encounter order.
    population.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    population
        .into_iter()
        .enumerate()
        .map(|(i, p)| RankedEntry {
            rank: i + 1,
            id: p.id,
            name: p.name,
            class_id: p.class_id,
            value: p.value,
        })
        .collect()
}

/// `None` returns the complete list unsliced.
pub fn top_n(mut ranked: Vec<RankedEntry>, n: Option<usize>) -> Vec<RankedEntry> {
    if let Some(n) = n {
        ranked.truncate(n);
    }
    ranked
}

pub fn total_population(aggregates: &StudentAggregates) -> Vec<RankInput> {
    aggregates
        .usable()
        .map(|s| RankInput {
            id: s.student_id.clone(),
            name: s.student_name.clone(),
            class_id: s.class_id.clone(),
            value: s.total_score,
        })
        .collect()
}

pub fn subject_population(aggregates: &StudentAggregates, subject_id: &str) -> Vec<RankInput> {
    aggregates
        .subject_scores(subject_id)
        .into_iter()
        .map(|(s, v)| RankInput {
            id: s.student_id.clone(),
            name: s.student_name.clone(),
            class_id: s.class_id.clone(),
            value: v,
        })
        .collect()
}
