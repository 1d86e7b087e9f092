//! Translation Overlay for open tabs.
//!
//! Fetches a translated rendering of one tab's article and attaches it to
//! the tab when the response arrives. Jobs are independent of each other and
//! are not cancelled when their tab closes; a late result for a closed tab is
//! dropped by the registry.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::managers::tab_registry::{TabRegistry, TabRegistryTrait};
use crate::services::backend::ZimBackend;
use crate::types::errors::TranslationError;
use crate::types::tab::Tab;
use crate::types::translation::{Notice, TranslationJob, TranslationOutcome};

/// Sink for messages shown inline by the presentation layer.
pub type NoticeSink = Arc<dyn Fn(Notice) + Send + Sync>;

pub struct TranslationOverlay {
    backend: Arc<dyn ZimBackend>,
    registry: Arc<Mutex<TabRegistry>>,
    notices: NoticeSink,
}

impl TranslationOverlay {
    pub fn new(
        backend: Arc<dyn ZimBackend>,
        registry: Arc<Mutex<TabRegistry>>,
        notices: NoticeSink,
    ) -> Self {
        Self {
            backend,
            registry,
            notices,
        }
    }

    /// Translate `tab` into `to_lang` in the background.
    ///
    /// On success the translated text is patched onto the tab if it is still
    /// open. On failure a notice is published and the tab keeps its original
    /// content. The handle resolves once the job has finished either way.
    pub fn translate(
        &self,
        tab: &Tab,
        to_lang: &str,
    ) -> JoinHandle<Result<TranslationOutcome, TranslationError>> {
        let job = TranslationJob::for_tab(tab, to_lang);
        let backend = self.backend.clone();
        let registry = self.registry.clone();
        let notices = self.notices.clone();

        tokio::spawn(async move {
            info!(job_id = %job.job_id, tab_id = %job.target_tab_id, to_lang = %job.to_lang, "translating tab");
            match Self::fetch(backend.as_ref(), &job).await {
                Ok(translated) => Ok(Self::apply(&registry, &job, &translated)),
                Err(e) => {
                    warn!(job_id = %job.job_id, error = %e, "translation failed");
                    notices(Notice::TranslationFailed {
                        tab_id: job.target_tab_id.clone(),
                        message: e.to_string(),
                    });
                    Err(e)
                }
            }
        })
    }

    async fn fetch(backend: &dyn ZimBackend, job: &TranslationJob) -> Result<String, TranslationError> {
        if job.to_lang.trim().is_empty() {
            return Err(TranslationError::MissingLanguage);
        }
        backend
            .translate_article(&job.zim_id, &job.path, &job.to_lang)
            .await
    }

    fn apply(registry: &Mutex<TabRegistry>, job: &TranslationJob, translated: &str) -> TranslationOutcome {
        let mut registry = match registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if registry.patch_tab_content(&job.target_tab_id, translated) {
            TranslationOutcome::Applied
        } else {
            debug!(job_id = %job.job_id, "tab closed before translation arrived");
            TranslationOutcome::Discarded
        }
    }
}
