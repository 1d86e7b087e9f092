use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tab::Tab;

/// A single in-flight translation request for one tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationJob {
    pub job_id: String,
    pub target_tab_id: String,
    pub zim_id: String,
    pub path: String,
    pub to_lang: String,
}

impl TranslationJob {
    pub fn for_tab(tab: &Tab, to_lang: &str) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            target_tab_id: tab.id.clone(),
            zim_id: tab.zim_id.clone(),
            path: tab.path.clone(),
            to_lang: to_lang.to_string(),
        }
    }
}

/// What happened to a successful translation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TranslationOutcome {
    /// The tab was still open and now carries the translated text.
    Applied,
    /// The tab was closed before the response arrived.
    Discarded,
}

/// An installed language pair offered by the translator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationModel {
    pub from_code: String,
    pub to_code: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub to_name: String,
}

/// Response body of the article translation endpoint: either
/// `{"translated": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateArticleResponse {
    pub translated: Option<String>,
    pub error: Option<String>,
}

/// Inline message for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    TranslationFailed { tab_id: String, message: String },
}
