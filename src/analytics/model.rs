use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub name: String,
    pub grade_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRef {
    pub id: String,
    pub grade_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubject {
    pub id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub max_score: f64,
    pub weight: f64,
    pub include_in_total: bool,
    pub include_in_rank: bool,
    pub excellent_line: Option<f64>,
    pub pass_line: Option<f64>,
    pub low_line: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub class_name: String,
    pub exam_subject_id: String,
    pub raw_score: f64,
    pub is_absent: bool,
}

#[derive(Debug, Clone)]
pub struct ScoreSegment {
    pub id: String,
    pub grade_id: String,
    /// `None` applies to the student total.
    pub subject_id: Option<String>,
    pub excellent_min: f64,
    pub good_min: f64,
    pub pass_min: f64,
    pub fail_max: f64,
    pub is_default: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineType {
    #[serde(rename = "first-tier")]
    FirstTier,
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "custom")]
    Custom,
}

impl LineType {
    /// Accepts both the stored form (`first_tier`) and the wire form (`first-tier`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_tier" | "first-tier" | "firsttier" => Some(Self::FirstTier),
            "regular" => Some(Self::Regular),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreLine {
    pub id: String,
    pub grade_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub line_type: LineType,
    pub score_value: f64,
    pub is_active: bool,
}

/// Everything one request reads about a single exam, fetched once up front.
#[derive(Debug, Clone)]
pub struct ExamSnapshot {
    pub exam: Exam,
    pub class_id: Option<String>,
    pub subjects: Vec<ExamSubject>,
    pub records: Vec<ScoreRecord>,
}

impl ExamSnapshot {
    pub fn exam_subject(&self, exam_subject_id: &str) -> Option<&ExamSubject> {
        self.subjects.iter().find(|s| s.id == exam_subject_id)
    }

    pub fn subject(&self, subject_id: &str) -> Option<&ExamSubject> {
        self.subjects.iter().find(|s| s.subject_id == subject_id)
    }

    /// Maximum attainable total: the sum of `max_score` over total-eligible subjects.
    pub fn total_max_score(&self) -> f64 {
        self.subjects
            .iter()
            .filter(|s| s.include_in_total)
            .map(|s| s.max_score)
            .sum()
    }
}
