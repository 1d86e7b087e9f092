//! Backend client for the reader's REST service.
//!
//! `ZimBackend` is the seam between the session core and the outside world:
//! search (batch and event-stream), AI answers, translation and article
//! retrieval. `HttpBackend` implements it with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde_json::json;
use tracing::debug;

use crate::types::errors::{BackendError, TranslationError};
use crate::types::search::{AnswerResponse, BatchSearchResponse, SearchResult};
use crate::types::settings::{ClientSettings, ServerConfig};
use crate::types::translation::{TranslateArticleResponse, TranslationModel};

/// Raw body of a server-sent event stream.
pub type ByteStream = BoxStream<'static, Result<Bytes, BackendError>>;

/// Operations the session core consumes from the reader service.
#[async_trait]
pub trait ZimBackend: Send + Sync {
    async fn batch_search(&self, query: &str) -> Result<Vec<SearchResult>, BackendError>;
    async fn stream_search(&self, query: &str) -> Result<ByteStream, BackendError>;
    async fn answer_query(&self, query: &str) -> Result<String, BackendError>;
    /// Whether the AI answer capability is switched on server-side.
    async fn ai_enabled(&self) -> Result<bool, BackendError>;
    async fn translate_article(
        &self,
        zim_id: &str,
        path: &str,
        to_lang: &str,
    ) -> Result<String, TranslationError>;
    async fn translation_models(&self) -> Result<Vec<TranslationModel>, BackendError>;
    async fn fetch_article(&self, zim_id: &str, path: &str) -> Result<String, BackendError>;
    /// Address of the untranslated article, for opening outside the reader.
    fn article_url(&self, zim_id: &str, path: &str) -> String;
}

/// reqwest-backed client for the reader's REST API.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    base: reqwest::Url,
}

impl HttpBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()?;
        let base_url = settings.backend_url.trim_end_matches('/').to_string();
        let base = reqwest::Url::parse(&base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url));
        }
        Ok(Self {
            client,
            base_url,
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ZimBackend for HttpBackend {
    async fn batch_search(&self, query: &str) -> Result<Vec<SearchResult>, BackendError> {
        let body: BatchSearchResponse = self
            .client
            .get(self.url("/search"))
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(query, hits = body.results.len(), "batch search resolved");
        Ok(body.results)
    }

    async fn stream_search(&self, query: &str) -> Result<ByteStream, BackendError> {
        let response = self
            .client
            .get(self.url("/search/stream"))
            .query(&[("q", query)])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(BackendError::from))
            .boxed())
    }

    async fn answer_query(&self, query: &str) -> Result<String, BackendError> {
        let body: AnswerResponse = self
            .client
            .post(self.url("/llm/query"))
            .json(&json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.answer)
    }

    async fn ai_enabled(&self) -> Result<bool, BackendError> {
        let config: ServerConfig = self
            .client
            .get(self.url("/admin/config"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(config.llm_enabled)
    }

    async fn translate_article(
        &self,
        zim_id: &str,
        path: &str,
        to_lang: &str,
    ) -> Result<String, TranslationError> {
        let body: TranslateArticleResponse = self
            .client
            .post(self.url("/translate/article"))
            .json(&json!({ "zim_id": zim_id, "path": path, "to_lang": to_lang }))
            .send()
            .await
            .map_err(BackendError::from)?
            .error_for_status()
            .map_err(BackendError::from)?
            .json()
            .await
            .map_err(BackendError::from)?;

        match (body.translated, body.error) {
            (Some(text), _) => Ok(text),
            (None, Some(err)) => Err(TranslationError::Rejected(err)),
            (None, None) => Err(TranslationError::Rejected(
                "empty translation response".to_string(),
            )),
        }
    }

    async fn translation_models(&self) -> Result<Vec<TranslationModel>, BackendError> {
        let models = self
            .client
            .get(self.url("/translate/models"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(models)
    }

    async fn fetch_article(&self, zim_id: &str, path: &str) -> Result<String, BackendError> {
        let html = self
            .client
            .get(self.article_url(zim_id, path))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }

    /// Each segment of `path` is percent-encoded; `/` stays a separator.
    fn article_url(&self, zim_id: &str, path: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("article")
                .push(zim_id)
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }
        url.to_string()
    }
}
