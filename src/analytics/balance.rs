use super::aggregate::StudentAggregates;
use super::model::ExamSubject;
use super::ranking::{rank, subject_population};
use super::stats::{mean, round_percent};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStanding {
    pub subject_id: String,
    pub subject_name: String,
    pub percentile: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImbalancedSubjects {
    pub weak: Vec<SubjectStanding>,
    pub strong: Vec<SubjectStanding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub average_percentile: i64,
    pub max_percentile: i64,
    pub min_percentile: i64,
    pub max_percentile_diff: i64,
    pub is_imbalanced: bool,
    pub imbalanced_subjects: ImbalancedSubjects,
    pub standings: Vec<SubjectStanding>,
}

/// `round((N - rank) / N * 100)` with `rank` 1-based: the top scorer approaches
/// 100 and the last one lands on 0.
pub fn percentile(rank: usize, n: usize) -> i64 {
    if n == 0 {
        return 0;
    }
    round_percent((n.saturating_sub(rank) as f64) / (n as f64) * 100.0)
}

/// Within-subject percentile per student, subjects in exam order.
pub fn subject_percentiles(
    aggregates: &StudentAggregates,
    subjects: &[ExamSubject],
) -> HashMap<String, Vec<SubjectStanding>> {
    let mut out: HashMap<String, Vec<SubjectStanding>> = HashMap::new();
    for subject in subjects {
        let ranked = rank(subject_population(aggregates, &subject.subject_id));
        let n = ranked.len();
        for entry in ranked {
            out.entry(entry.id).or_default().push(SubjectStanding {
                subject_id: subject.subject_id.clone(),
                subject_name: subject.subject_name.clone(),
                percentile: percentile(entry.rank, n),
            });
        }
    }
    out
}

pub fn analyze_balance(
    aggregates: &StudentAggregates,
    subjects: &[ExamSubject],
    threshold: f64,
) -> Vec<BalanceEntry> {
    let mut standings = subject_percentiles(aggregates, subjects);

    let mut out: Vec<BalanceEntry> = Vec::new();
    for student in aggregates.iter() {
        let Some(list) = standings.remove(&student.student_id) else {
            continue;
        };
        let Some(max) = list.iter().map(|s| s.percentile).max() else {
            continue;
        };
        let min = list.iter().map(|s| s.percentile).min().unwrap_or(max);
        let values: Vec<f64> = list.iter().map(|s| s.percentile as f64).collect();
        let diff = max - min;
        let is_imbalanced = (diff as f64) > threshold;

        let imbalanced_subjects = if is_imbalanced {
            ImbalancedSubjects {
                weak: list.iter().filter(|s| s.percentile == min).cloned().collect(),
                strong: list.iter().filter(|s| s.percentile == max).cloned().collect(),
            }
        } else {
            ImbalancedSubjects::default()
        };

        out.push(BalanceEntry {
            student_id: student.student_id.clone(),
            student_name: student.student_name.clone(),
            class_id: student.class_id.clone(),
            average_percentile: round_percent(mean(&values)),
            max_percentile: max,
            min_percentile: min,
            max_percentile_diff: diff,
            is_imbalanced,
            imbalanced_subjects,
            standings: list,
        });
    }

    // Stable: equal spreads keep encounter order.
    out.sort_by(|a, b| b.max_percentile_diff.cmp(&a.max_percentile_diff));
    out
}
