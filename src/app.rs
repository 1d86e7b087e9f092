//! Session Coordinator for the reader.
//!
//! Composition root holding the tab registry, the search session and the
//! translation overlay. The presentation layer talks only to this type.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::managers::tab_registry::{SubscriptionId, TabRegistry, TabRegistryTrait};
use crate::services::backend::ZimBackend;
use crate::services::search_session::{SearchListener, SearchSession};
use crate::services::translation_overlay::{NoticeSink, TranslationOverlay};
use crate::types::errors::{BackendError, TabError, TranslationError};
use crate::types::search::{SearchResult, SearchSnapshot};
use crate::types::settings::ClientSettings;
use crate::types::tab::{Tab, TabContent, TabSet};
use crate::types::translation::{TranslationModel, TranslationOutcome};

pub type TranslationTask = JoinHandle<Result<TranslationOutcome, TranslationError>>;

/// Central struct wiring search results to tabs.
pub struct SessionCoordinator {
    backend: Arc<dyn ZimBackend>,
    settings: Mutex<ClientSettings>,
    registry: Arc<Mutex<TabRegistry>>,
    search: SearchSession,
    translator: TranslationOverlay,
}

impl SessionCoordinator {
    /// Creates a coordinator. `listener` receives search progress and
    /// `notices` receives inline messages such as translation failures.
    pub fn new(
        backend: Arc<dyn ZimBackend>,
        settings: ClientSettings,
        listener: Arc<dyn SearchListener>,
        notices: NoticeSink,
    ) -> Self {
        let registry = Arc::new(Mutex::new(TabRegistry::new()));
        let search = SearchSession::new(backend.clone(), listener);
        let translator = TranslationOverlay::new(backend.clone(), registry.clone(), notices);
        Self {
            backend,
            settings: Mutex::new(settings),
            registry,
            search,
            translator,
        }
    }

    fn registry(&self) -> MutexGuard<'_, TabRegistry> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn settings_guard(&self) -> MutexGuard<'_, ClientSettings> {
        match self.settings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ─── Tabs ───

    pub fn open_tab(&self, zim_id: &str, path: &str, title: &str) -> String {
        self.registry().open_tab(zim_id, path, title)
    }

    /// Open the article behind a search hit.
    pub fn open_result(&self, result: &SearchResult) -> String {
        self.open_tab(&result.zim_id, &result.path, &result.title)
    }

    pub fn close_tab(&self, tab_id: &str) {
        self.registry().close_tab(tab_id);
    }

    pub fn select_tab(&self, tab_id: &str) {
        self.registry().select_tab(tab_id);
    }

    pub fn get_active_tab(&self) -> Option<Tab> {
        self.registry().get_active_tab().cloned()
    }

    pub fn get_tab(&self, tab_id: &str) -> Option<Tab> {
        self.registry().get_tab(tab_id).cloned()
    }

    pub fn tabs(&self) -> TabSet {
        self.registry().snapshot()
    }

    /// Subscribe to tab set changes. The callback must not call back into
    /// the coordinator's tab operations.
    pub fn subscribe_tabs(
        &self,
        subscriber: impl Fn(&TabSet) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.registry().subscribe(Box::new(subscriber))
    }

    pub fn unsubscribe_tabs(&self, id: SubscriptionId) -> bool {
        self.registry().unsubscribe(id)
    }

    /// Resolve what a tab displays: its translation if one has been applied,
    /// otherwise the original article.
    pub async fn tab_content(&self, tab_id: &str) -> Result<TabContent, TabError> {
        let tab = self
            .get_tab(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;

        if let Some(translated) = tab.translated_content {
            return Ok(TabContent::Translated {
                html: format!("<html><body>{}</body></html>", translated),
            });
        }

        let url = self.backend.article_url(&tab.zim_id, &tab.path);
        let html = self.backend.fetch_article(&tab.zim_id, &tab.path).await?;
        Ok(TabContent::Article { url, html })
    }

    // ─── Search ───

    /// Start a search. `streaming` falls back to the configured default.
    pub fn search(&self, query: &str, streaming: Option<bool>) {
        let streaming = streaming.unwrap_or_else(|| self.settings_guard().streaming_search);
        self.search.run(query, streaming);
    }

    pub fn cancel_search(&self) {
        self.search.cancel();
    }

    pub fn current_search(&self) -> SearchSnapshot {
        self.search.current_snapshot()
    }

    // ─── Translation ───

    /// Translate an open tab. An empty `to_lang` falls back to the configured
    /// default language. Returns `None` if the tab is not open.
    pub fn translate_tab(&self, tab_id: &str, to_lang: &str) -> Option<TranslationTask> {
        let Some(tab) = self.get_tab(tab_id) else {
            debug!(tab_id, "translate requested for closed tab");
            return None;
        };
        let to_lang = if to_lang.trim().is_empty() {
            self.settings_guard()
                .default_translation_language
                .clone()
                .unwrap_or_default()
        } else {
            to_lang.to_string()
        };
        Some(self.translator.translate(&tab, &to_lang))
    }

    pub async fn translation_models(&self) -> Result<Vec<TranslationModel>, BackendError> {
        self.backend.translation_models().await
    }

    // ─── Settings ───

    pub fn settings(&self) -> ClientSettings {
        self.settings_guard().clone()
    }

    /// Replace the runtime settings. The backend address is fixed at
    /// construction and is not affected.
    pub fn update_settings(&self, settings: ClientSettings) {
        *self.settings_guard() = settings;
    }
}
