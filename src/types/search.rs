use serde::{Deserialize, Serialize};

/// One search hit. The wire format uses the same snake_case field names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SearchResult {
    pub zim_id: String,
    pub path: String,
    pub title: String,
}

impl SearchResult {
    pub fn new(zim_id: &str, path: &str, title: &str) -> Self {
        Self {
            zim_id: zim_id.to_string(),
            path: path.to_string(),
            title: title.to_string(),
        }
    }
}

/// Cumulative state of one search operation at a point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub answer: String,
}

/// How the results axis of a search ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SearchOutcome {
    Completed,
    Failed(String),
}

/// Response body of the batch search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Response body of the AI answer endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub answer: String,
}
