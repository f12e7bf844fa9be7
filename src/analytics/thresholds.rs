//! Score-segment and score-line resolution.
//!
//! Segment boundaries come from an ordered list of strategies. Each strategy
//! either produces thresholds or has no opinion, and the first opinion wins:
//!
//! 1. an active configured segment for the grade and exact subject
//!    (`NULL` subject when resolving for the total),
//! 2. the exam subject's own `excellentLine` / `passLine`,
//! 3. fixed percentages of the maximum score (90 / 80 / 60).
//!
//! The last tier always answers, so resolution never fails.

use super::model::{ExamSubject, LineType, ScoreLine, ScoreSegment};
use serde::Serialize;

const EXCELLENT_PERCENT: f64 = 90.0;
const GOOD_PERCENT: f64 = 80.0;
const PASS_PERCENT: f64 = 60.0;

fn percent_of(max_score: f64, pct: f64) -> f64 {
    max_score * pct / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentThresholds {
    pub excellent_min: f64,
    pub good_min: f64,
    pub pass_min: f64,
    pub fail_max: f64,
}

impl SegmentThresholds {
    pub fn percent_of_max(max_score: f64) -> Self {
        let pass_min = percent_of(max_score, PASS_PERCENT);
        Self {
            excellent_min: percent_of(max_score, EXCELLENT_PERCENT),
            good_min: percent_of(max_score, GOOD_PERCENT),
            pass_min,
            fail_max: pass_min - 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdSource {
    Configured,
    SubjectLines,
    PercentOfMax,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSegment {
    #[serde(flatten)]
    pub thresholds: SegmentThresholds,
    pub source: ThresholdSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SegmentQuery<'a> {
    pub grade_id: &'a str,
    /// `None` resolves boundaries for the student total.
    pub subject: Option<&'a ExamSubject>,
    pub max_score: f64,
    pub segments: &'a [ScoreSegment],
}

trait SegmentStrategy {
    fn resolve(&self, query: &SegmentQuery<'_>) -> Option<ResolvedSegment>;
}

struct ConfiguredSegment;
struct SubjectLines;
struct PercentOfMax;

impl SegmentStrategy for ConfiguredSegment {
    fn resolve(&self, query: &SegmentQuery<'_>) -> Option<ResolvedSegment> {
        let subject_id = query.subject.map(|s| s.subject_id.as_str());
        let matches: Vec<&ScoreSegment> = query
            .segments
            .iter()
            .filter(|s| s.is_active && s.grade_id == query.grade_id)
            .filter(|s| s.subject_id.as_deref() == subject_id)
            .collect();
        let picked = matches
            .iter()
            .find(|s| s.is_default)
            .or_else(|| matches.first())?;
        Some(ResolvedSegment {
            thresholds: SegmentThresholds {
                excellent_min: picked.excellent_min,
                good_min: picked.good_min,
                pass_min: picked.pass_min,
                fail_max: picked.fail_max,
            },
            source: ThresholdSource::Configured,
            segment_id: Some(picked.id.clone()),
        })
    }
}

impl SegmentStrategy for SubjectLines {
    fn resolve(&self, query: &SegmentQuery<'_>) -> Option<ResolvedSegment> {
        let subject = query.subject?;
        if subject.excellent_line.is_none() && subject.pass_line.is_none() {
            return None;
        }
        let max = query.max_score;
        let pass_min = subject.pass_line.unwrap_or(percent_of(max, PASS_PERCENT));
        Some(ResolvedSegment {
            thresholds: SegmentThresholds {
                excellent_min: subject.excellent_line.unwrap_or(percent_of(max, EXCELLENT_PERCENT)),
                good_min: percent_of(max, GOOD_PERCENT),
                pass_min,
                fail_max: pass_min - 1.0,
            },
            source: ThresholdSource::SubjectLines,
            segment_id: None,
        })
    }
}

impl SegmentStrategy for PercentOfMax {
    fn resolve(&self, query: &SegmentQuery<'_>) -> Option<ResolvedSegment> {
        Some(ResolvedSegment {
            thresholds: SegmentThresholds::percent_of_max(query.max_score),
            source: ThresholdSource::PercentOfMax,
            segment_id: None,
        })
    }
}

const STRATEGIES: &[&dyn SegmentStrategy] = &[&ConfiguredSegment, &SubjectLines, &PercentOfMax];

pub fn resolve_segment(query: &SegmentQuery<'_>) -> ResolvedSegment {
    for strategy in STRATEGIES {
        if let Some(resolved) = strategy.resolve(query) {
            return resolved;
        }
    }
    // Unreachable while PercentOfMax closes the chain.
    ResolvedSegment {
        thresholds: SegmentThresholds::percent_of_max(query.max_score),
        source: ThresholdSource::PercentOfMax,
        segment_id: None,
    }
}

pub fn resolve_lines(grade_id: &str, line_type: Option<LineType>, lines: &[ScoreLine]) -> Vec<ScoreLine> {
    lines
        .iter()
        .filter(|l| l.is_active && l.grade_id == grade_id)
        .filter(|l| line_type.map(|t| l.line_type == t).unwrap_or(true))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(excellent: Option<f64>, pass: Option<f64>) -> ExamSubject {
        ExamSubject {
            id: "es-math".into(),
            subject_id: "math".into(),
            subject_name: "Math".into(),
            max_score: 100.0,
            weight: 1.0,
            include_in_total: true,
            include_in_rank: true,
            excellent_line: excellent,
            pass_line: pass,
            low_line: None,
        }
    }

    fn segment(id: &str, subject_id: Option<&str>, excellent: f64, is_default: bool) -> ScoreSegment {
        ScoreSegment {
            id: id.into(),
            grade_id: "g1".into(),
            subject_id: subject_id.map(|s| s.to_string()),
            excellent_min: excellent,
            good_min: 75.0,
            pass_min: 55.0,
            fail_max: 54.0,
            is_default,
            is_active: true,
        }
    }

    fn line(id: &str, grade: &str, line_type: LineType, active: bool) -> ScoreLine {
        ScoreLine {
            id: id.into(),
            grade_id: grade.into(),
            name: id.to_uppercase(),
            line_type,
            score_value: 500.0,
            is_active: active,
        }
    }

    #[test]
    fn falls_back_to_percent_of_max_without_any_configuration() {
        let s = subject(None, None);
        let r = resolve_segment(&SegmentQuery {
            grade_id: "g1",
            subject: Some(&s),
            max_score: 100.0,
            segments: &[],
        });
        assert_eq!(r.source, ThresholdSource::PercentOfMax);
        assert_eq!(r.thresholds.excellent_min, 90.0);
        assert_eq!(r.thresholds.good_min, 80.0);
        assert_eq!(r.thresholds.pass_min, 60.0);
        assert_eq!(r.thresholds.fail_max, 59.0);
    }

    #[test]
    fn subject_lines_synthesize_good_and_fail() {
        let s = subject(Some(85.0), Some(50.0));
        let r = resolve_segment(&SegmentQuery {
            grade_id: "g1",
            subject: Some(&s),
            max_score: 100.0,
            segments: &[],
        });
        assert_eq!(r.source, ThresholdSource::SubjectLines);
        assert_eq!(r.thresholds.excellent_min, 85.0);
        assert_eq!(r.thresholds.good_min, 80.0);
        assert_eq!(r.thresholds.pass_min, 50.0);
        assert_eq!(r.thresholds.fail_max, 49.0);
    }

    #[test]
    fn a_single_subject_line_fills_the_other_from_percentages() {
        let s = subject(None, Some(70.0));
        let r = resolve_segment(&SegmentQuery {
            grade_id: "g1",
            subject: Some(&s),
            max_score: 200.0,
            segments: &[],
        });
        assert_eq!(r.source, ThresholdSource::SubjectLines);
        assert_eq!(r.thresholds.excellent_min, 180.0);
        assert_eq!(r.thresholds.good_min, 160.0);
        assert_eq!(r.thresholds.pass_min, 70.0);
    }

    #[test]
    fn configured_segment_beats_subject_lines_and_prefers_default() {
        let s = subject(Some(85.0), Some(50.0));
        let segments = vec![
            segment("plain", Some("math"), 88.0, false),
            segment("dflt", Some("math"), 92.0, true),
            segment("total", None, 600.0, true),
        ];
        let r = resolve_segment(&SegmentQuery {
            grade_id: "g1",
            subject: Some(&s),
            max_score: 100.0,
            segments: &segments,
        });
        assert_eq!(r.source, ThresholdSource::Configured);
        assert_eq!(r.segment_id.as_deref(), Some("dflt"));
        assert_eq!(r.thresholds.excellent_min, 92.0);
    }

    #[test]
    fn total_resolution_only_sees_null_subject_segments() {
        let segments = vec![segment("math-only", Some("math"), 88.0, true)];
        let r = resolve_segment(&SegmentQuery {
            grade_id: "g1",
            subject: None,
            max_score: 600.0,
            segments: &segments,
        });
        assert_eq!(r.source, ThresholdSource::PercentOfMax);
        assert_eq!(r.thresholds.excellent_min, 540.0);

        let mut inactive = segment("total", None, 500.0, true);
        inactive.is_active = false;
        let other_grade = ScoreSegment {
            grade_id: "g2".into(),
            ..segment("g2-total", None, 510.0, true)
        };
        let r = resolve_segment(&SegmentQuery {
            grade_id: "g1",
            subject: None,
            max_score: 600.0,
            segments: &[inactive, other_grade],
        });
        assert_eq!(r.source, ThresholdSource::PercentOfMax);
    }

    #[test]
    fn subject_segment_does_not_fall_back_to_grade_total_segment() {
        let s = subject(None, None);
        let segments = vec![segment("total", None, 540.0, true)];
        let r = resolve_segment(&SegmentQuery {
            grade_id: "g1",
            subject: Some(&s),
            max_score: 100.0,
            segments: &segments,
        });
        assert_eq!(r.source, ThresholdSource::PercentOfMax);
    }

    #[test]
    fn lines_filter_by_grade_activity_and_type() {
        let lines = vec![
            line("a", "g1", LineType::FirstTier, true),
            line("b", "g1", LineType::Regular, true),
            line("c", "g1", LineType::Regular, false),
            line("d", "g2", LineType::Regular, true),
        ];
        let all = resolve_lines("g1", None, &lines);
        assert_eq!(all.len(), 2);
        let regular = resolve_lines("g1", Some(LineType::Regular), &lines);
        assert_eq!(regular.len(), 1);
        assert_eq!(regular[0].id, "b");
        assert!(resolve_lines("g1", Some(LineType::Custom), &lines).is_empty());
    }
}
