use super::model::ExamSnapshot;
use super::stats::{mean, median, round2, std_dev};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAggregate {
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub class_name: String,
    /// Non-absent scores keyed by subject id.
    pub scores: BTreeMap<String, f64>,
    pub total_score: f64,
    pub valid_subject_count: usize,
    pub absent_count: usize,
}

impl StudentAggregate {
    /// A total of exactly zero is indistinguishable from "no score data" and is
    /// dropped from every total-based list.
    pub fn has_usable_total(&self) -> bool {
        self.total_score > 0.0
    }
}

/// Per-request arena of student aggregates, kept in first-encounter order.
#[derive(Debug, Clone, Default)]
pub struct StudentAggregates {
    students: Vec<StudentAggregate>,
    index: HashMap<String, usize>,
    records_examined: usize,
    absent_records: usize,
}

impl StudentAggregates {
    pub fn iter(&self) -> std::slice::Iter<'_, StudentAggregate> {
        self.students.iter()
    }

    pub fn usable(&self) -> impl Iterator<Item = &StudentAggregate> {
        self.students.iter().filter(|s| s.has_usable_total())
    }

    #[cfg(test)]
    pub fn get(&self, student_id: &str) -> Option<&StudentAggregate> {
        self.index.get(student_id).map(|&i| &self.students[i])
    }

    /// Raw population size, including students with no usable total.
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn records_examined(&self) -> usize {
        self.records_examined
    }

    pub fn absent_records(&self) -> usize {
        self.absent_records
    }

    pub fn usable_totals(&self) -> Vec<f64> {
        self.usable().map(|s| s.total_score).collect()
    }

    /// `(student, score)` pairs for one subject, absences excluded.
    pub fn subject_scores(&self, subject_id: &str) -> Vec<(&StudentAggregate, f64)> {
        self.students
            .iter()
            .filter_map(|s| s.scores.get(subject_id).map(|v| (s, *v)))
            .collect()
    }
}

pub fn aggregate(snapshot: &ExamSnapshot) -> StudentAggregates {
    let mut out = StudentAggregates::default();

    for record in &snapshot.records {
        out.records_examined += 1;
        let Some(subject) = snapshot.exam_subject(&record.exam_subject_id) else {
            continue;
        };

        let existing = out.index.get(&record.student_id).copied();
        let idx = match existing {
            Some(i) => i,
            None => {
                out.students.push(StudentAggregate {
                    student_id: record.student_id.clone(),
                    student_name: record.student_name.clone(),
                    class_id: record.class_id.clone(),
                    class_name: record.class_name.clone(),
                    scores: BTreeMap::new(),
                    total_score: 0.0,
                    valid_subject_count: 0,
                    absent_count: 0,
                });
                let i = out.students.len() - 1;
                out.index.insert(record.student_id.clone(), i);
                i
            }
        };
        let student = &mut out.students[idx];

        if record.is_absent {
            out.absent_records += 1;
            student.absent_count += 1;
            continue;
        }

        student
            .scores
            .insert(subject.subject_id.clone(), record.raw_score);
        student.valid_subject_count += 1;
        if subject.include_in_total {
            student.total_score += record.raw_score;
        }
    }

    out
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAggregate {
    pub class_id: String,
    pub class_name: String,
    pub student_count: usize,
    pub average: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub std_dev: f64,
    pub totals: Vec<f64>,
}

/// An empty class yields zero-valued placeholders rather than an error.
pub fn class_summary(class_id: &str, class_name: &str, totals: Vec<f64>) -> ClassAggregate {
    let (max, min) = if totals.is_empty() {
        (0.0, 0.0)
    } else {
        (
            totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            totals.iter().copied().fold(f64::INFINITY, f64::min),
        )
    };
    ClassAggregate {
        class_id: class_id.to_string(),
        class_name: class_name.to_string(),
        student_count: totals.len(),
        average: round2(mean(&totals)),
        median: round2(median(&totals)),
        max: round2(max),
        min: round2(min),
        std_dev: round2(std_dev(&totals)),
        totals,
    }
}

/// Groups usable totals by class. Classes whose students all lack a usable
/// total still appear, with zero placeholders.
pub fn class_aggregates(aggregates: &StudentAggregates) -> Vec<ClassAggregate> {
    let mut by_class: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for s in aggregates.iter() {
        let entry = by_class
            .entry((s.class_name.clone(), s.class_id.clone()))
            .or_default();
        if s.has_usable_total() {
            entry.push(s.total_score);
        }
    }
    // BTreeMap keys already order by class name, then id.
    by_class
        .into_iter()
        .map(|((name, id), totals)| class_summary(&id, &name, totals))
        .collect()
}
