//! Analysis defaults persisted in the workspace `settings` table.

use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ANALYSIS_KEY: &str = "setup.analysis";
pub const WORKSPACE_ENV: &str = "SCORED_WORKSPACE";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    /// Half-width of the critical band around a score line.
    pub critical_range: f64,
    /// Percentile spread above which a student is flagged as imbalanced.
    pub balance_threshold: f64,
    /// Entry count for the bounded top-N ranking view.
    pub default_top_n: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            critical_range: crate::analytics::critical::DEFAULT_RANGE,
            balance_threshold: crate::analytics::balance::DEFAULT_THRESHOLD,
            default_top_n: 10,
        }
    }
}

fn parse_f64_range(v: &Value, key: &str, min: f64, max: f64) -> Result<f64, String> {
    let n = v
        .as_f64()
        .ok_or_else(|| format!("{} must be a number", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

impl AnalysisSettings {
    /// Applies a patch field by field. On error `self` may be partially updated;
    /// callers work on a copy.
    pub fn merge_patch(&mut self, patch: &Map<String, Value>) -> Result<(), String> {
        for (k, v) in patch {
            match k.as_str() {
                "criticalRange" => self.critical_range = parse_f64_range(v, k, 0.0, 1000.0)?,
                "balanceThreshold" => {
                    self.balance_threshold = parse_f64_range(v, k, 0.0, 100.0)?
                }
                "defaultTopN" => self.default_top_n = parse_i64_range(v, k, 1, 500)? as usize,
                _ => return Err(format!("unknown analysis field: {}", k)),
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub fn load_analysis(conn: &Connection) -> anyhow::Result<AnalysisSettings> {
    let mut current = AnalysisSettings::default();
    if let Some(saved) = db::settings_get_json(conn, ANALYSIS_KEY)? {
        if let Some(saved_obj) = saved.as_object() {
            // Fields are applied one at a time; a bad stored field keeps the default.
            for (k, v) in saved_obj {
                let mut one = Map::new();
                one.insert(k.clone(), v.clone());
                let mut candidate = current;
                if candidate.merge_patch(&one).is_ok() {
                    current = candidate;
                }
            }
        }
    }
    Ok(current)
}

pub fn save_analysis(conn: &Connection, settings: &AnalysisSettings) -> anyhow::Result<()> {
    db::settings_set_json(conn, ANALYSIS_KEY, &settings.to_json())
}
