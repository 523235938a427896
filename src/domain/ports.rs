use crate::domain::model::CatalogRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings the lookup pipeline and session read from whichever config source is active.
pub trait ConfigProvider: Send + Sync {
    fn collection_endpoint(&self) -> &str;
    fn named_endpoint(&self) -> &str;
    fn batch_size(&self) -> usize;
    fn request_delay_ms(&self) -> u64;
    fn max_fallback_failures(&self) -> usize;
    fn user_agent(&self) -> &str;
    fn request_timeout(&self) -> Option<std::time::Duration>;
    fn cache_dir(&self) -> &str;
}

/// One page of a collection lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionPage {
    pub found: Vec<CatalogRecord>,
    pub not_found: Vec<String>,
}

/// Remote card database.
#[async_trait]
pub trait CardCatalog: Send + Sync {
    /// Resolve up to one batch of names in a single request.
    async fn fetch_collection(&self, names: &[String]) -> Result<CollectionPage>;

    /// Best-effort fuzzy lookup; `Ok(None)` when the catalog has no match.
    async fn fetch_named_fuzzy(&self, name: &str) -> Result<Option<CatalogRecord>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    pub thread_name: String,
    pub embeds: Vec<Embed>,
}

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, payload: &WebhookPayload) -> Result<()>;
}
