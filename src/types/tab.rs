use serde::{Deserialize, Serialize};

/// An open article view, keyed by its corpus and in-corpus path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tab {
    pub id: String,
    pub zim_id: String,
    pub path: String,
    pub title: String,
    pub translated_content: Option<String>,
}

impl Tab {
    pub fn new(zim_id: &str, path: &str, title: &str) -> Self {
        Self {
            id: Self::key(zim_id, path),
            zim_id: zim_id.to_string(),
            path: path.to_string(),
            title: title.to_string(),
            translated_content: None,
        }
    }

    /// Composite identity of a tab: `zim_id:path`.
    pub fn key(zim_id: &str, path: &str) -> String {
        format!("{}:{}", zim_id, path)
    }

    pub fn is_translated(&self) -> bool {
        self.translated_content.is_some()
    }
}

/// Immutable view of the open tabs in tab-bar order plus the active key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabSet {
    pub tabs: Vec<Tab>,
    pub active_id: Option<String>,
}

impl TabSet {
    pub fn ids(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active_id
            .as_deref()
            .and_then(|id| self.tabs.iter().find(|t| t.id == id))
    }
}

/// What a tab should display right now.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TabContent {
    /// Original article, fetched from the backend.
    Article { url: String, html: String },
    /// Translated text, wrapped as a standalone document.
    Translated { html: String },
}
