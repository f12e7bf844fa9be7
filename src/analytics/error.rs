use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    BadParams(String),
    #[error("store query failed: {0}")]
    Store(#[from] rusqlite::Error),
}

impl AnalyticsError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Wire error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::BadParams(_) => "bad_params",
            Self::Store(_) => "db_query_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::NotFound { entity, id } => Some(serde_json::json!({
                "entity": entity,
                "id": id,
            })),
            _ => None,
        }
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
