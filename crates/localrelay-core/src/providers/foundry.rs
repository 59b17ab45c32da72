//! Foundry Local model manager
//!
//! REST client for the Foundry Local service. The service exposes its catalog
//! and load controls under `/foundry` and `/openai`, and serves chat
//! completions on an OpenAI-compatible surface at `{service_url}/v1`.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::logging::Logger;
use crate::types::ModelInfo;

use super::error::{ProviderError, ProviderResult};
use super::openai_compat::NO_KEY_REQUIRED;
use super::traits::ModelManager;

/// Default Foundry Local service URL
pub const FOUNDRY_SERVICE_URL: &str = "http://127.0.0.1:5273";

/// Seconds a loaded model stays resident without use
const LOAD_TTL_SECS: u64 = 600;

const PROVIDER_ID: &str = "foundry";

/// Model manager backed by a running Foundry Local service
pub struct FoundryLocalManager {
    service_url: String,
    api_key: String,
    http: reqwest::Client,
    catalog: RwLock<Option<Vec<ModelInfo>>>,
    logger: Arc<dyn Logger>,
}

impl FoundryLocalManager {
    /// Create a manager for a service URL
    pub fn new(service_url: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            service_url: service_url.into().trim_end_matches('/').to_string(),
            api_key: NO_KEY_REQUIRED.to_string(),
            http: reqwest::Client::new(),
            catalog: RwLock::new(None),
            logger,
        }
    }

    /// Set the API key handed to chat clients
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// The service URL
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let url = format!("{}{}", self.service_url, path);
        self.logger.debug(&format!("[Foundry] GET {}", url));

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api_error(PROVIDER_ID, status.as_u16(), body));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Catalog, fetched once and cached
    async fn catalog(&self) -> ProviderResult<Vec<ModelInfo>> {
        let cached = self.catalog.read().clone();
        if let Some(models) = cached {
            return Ok(models);
        }

        let models: Vec<ModelInfo> = self.get_json("/foundry/list").await?;
        self.logger
            .debug(&format!("[Foundry] Catalog holds {} models", models.len()));
        *self.catalog.write() = Some(models.clone());
        Ok(models)
    }
}

/// Resolve against a catalog: exact id first, then the first alias match
fn resolve<'a>(catalog: &'a [ModelInfo], alias_or_id: &str) -> Option<&'a ModelInfo> {
    catalog
        .iter()
        .find(|m| m.id.eq_ignore_ascii_case(alias_or_id))
        .or_else(|| {
            catalog
                .iter()
                .find(|m| m.alias.eq_ignore_ascii_case(alias_or_id))
        })
}

#[async_trait]
impl ModelManager for FoundryLocalManager {
    async fn list_catalog_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        self.catalog().await
    }

    async fn list_loaded_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        let loaded: Vec<String> = self.get_json("/openai/loadedmodels").await?;
        let catalog = self.catalog().await?;

        Ok(loaded
            .iter()
            .map(|id| {
                resolve(&catalog, id)
                    .cloned()
                    .unwrap_or_else(|| ModelInfo::new(id.as_str(), id.as_str()))
            })
            .collect())
    }

    async fn get_model_info(&self, alias_or_id: &str) -> ProviderResult<ModelInfo> {
        let catalog = self.catalog().await?;
        resolve(&catalog, alias_or_id)
            .cloned()
            .ok_or_else(|| ProviderError::ModelNotFound(alias_or_id.to_string()))
    }

    async fn load_model(&self, alias_or_id: &str) -> ProviderResult<ModelInfo> {
        let info = self.get_model_info(alias_or_id).await?;
        let url = format!(
            "{}/openai/load/{}?ttl={}",
            self.service_url, info.id, LOAD_TTL_SECS
        );
        self.logger.info(&format!("[Foundry] Loading model {}", info.id));

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::api_error(PROVIDER_ID, status.as_u16(), body));
        }

        Ok(info)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1", self.service_url)
    }

    fn api_key(&self) -> String {
        self.api_key.clone()
    }
}
