use super::aggregate::StudentAggregates;
use super::model::{ExamSnapshot, ExamSubject};
use super::segments::{classify, SegmentDistribution};
use super::stats::{mean, percent, round2, summarize, StatsSummary};
use super::thresholds::{ResolvedSegment, SegmentThresholds, ThresholdSource};
use serde::Serialize;

const LOW_PERCENT: f64 = 40.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamOverview {
    pub exam_id: String,
    pub exam_name: String,
    pub grade_id: String,
    pub class_id: Option<String>,
    pub subject_count: usize,
    pub records_examined: usize,
    pub absent_record_count: usize,
    pub population_size: usize,
    pub ranked_student_count: usize,
    pub total_max_score: f64,
    pub total_stats: StatsSummary,
    pub segments: SegmentDistribution,
    pub thresholds: SegmentThresholds,
    pub threshold_source: ThresholdSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

pub fn exam_overview(
    snapshot: &ExamSnapshot,
    aggregates: &StudentAggregates,
    total_segment: &ResolvedSegment,
) -> ExamOverview {
    let totals = aggregates.usable_totals();
    ExamOverview {
        exam_id: snapshot.exam.id.clone(),
        exam_name: snapshot.exam.name.clone(),
        grade_id: snapshot.exam.grade_id.clone(),
        class_id: snapshot.class_id.clone(),
        subject_count: snapshot.subjects.len(),
        records_examined: aggregates.records_examined(),
        absent_record_count: aggregates.absent_records(),
        population_size: aggregates.len(),
        ranked_student_count: totals.len(),
        total_max_score: snapshot.total_max_score(),
        total_stats: summarize(&totals),
        segments: classify(&totals, &total_segment.thresholds),
        thresholds: total_segment.thresholds,
        threshold_source: total_segment.source,
        generated_at: None,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject_id: String,
    pub subject_name: String,
    pub max_score: f64,
    pub include_in_total: bool,
    pub include_in_rank: bool,
    pub record_count: usize,
    pub absent_count: usize,
    pub stats: StatsSummary,
    /// Mean as a percentage of `max_score`.
    pub score_rate: f64,
    pub excellent_rate: i64,
    pub pass_rate: i64,
    pub low_rate: i64,
    pub low_line: f64,
    pub segments: SegmentDistribution,
    pub thresholds: SegmentThresholds,
    pub threshold_source: ThresholdSource,
}

pub fn subject_stats(
    snapshot: &ExamSnapshot,
    aggregates: &StudentAggregates,
    subject: &ExamSubject,
    resolved: &ResolvedSegment,
) -> SubjectStats {
    let values: Vec<f64> = aggregates
        .subject_scores(&subject.subject_id)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    let absent_count = snapshot
        .records
        .iter()
        .filter(|r| r.exam_subject_id == subject.id && r.is_absent)
        .count();
    let segments = classify(&values, &resolved.thresholds);
    let low_line = subject
        .low_line
        .unwrap_or(subject.max_score * LOW_PERCENT / 100.0);
    let low_count = values.iter().filter(|v| **v < low_line).count();
    let score_rate = if subject.max_score > 0.0 {
        round2(100.0 * mean(&values) / subject.max_score)
    } else {
        0.0
    };

    SubjectStats {
        subject_id: subject.subject_id.clone(),
        subject_name: subject.subject_name.clone(),
        max_score: subject.max_score,
        include_in_total: subject.include_in_total,
        include_in_rank: subject.include_in_rank,
        record_count: values.len() + absent_count,
        absent_count,
        stats: summarize(&values),
        score_rate,
        excellent_rate: percent(segments.excellent_count, segments.total),
        pass_rate: percent(
            segments.excellent_count + segments.good_count + segments.pass_count,
            segments.total,
        ),
        low_rate: percent(low_count, values.len()),
        low_line,
        segments,
        thresholds: resolved.thresholds,
        threshold_source: resolved.source,
    }
}
