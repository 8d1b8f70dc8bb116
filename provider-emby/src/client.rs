//! Emby media-server client.
//!
//! Three calls are all the engine needs: a connectivity probe at
//! startup, a series search to discover the item id behind a task name,
//! and the per-item metadata refresh fired after new episodes land.

use crate::error::{EmbyError, Result};
use async_trait::async_trait;
use core_http::{HttpClient, HttpRequest};
use core_sync::MediaLibrary;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SystemInfo {
    #[serde(rename = "ServerName", default)]
    server_name: String,
    #[serde(rename = "Version", default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    #[serde(rename = "Items", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
}

pub struct EmbyClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    apikey: String,
}

impl EmbyClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str, apikey: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            apikey: apikey.to_string(),
        }
    }

    fn request(&self, request: HttpRequest) -> HttpRequest {
        request.header("x-emby-token", &self.apikey)
    }

    /// Connectivity probe; returns a printable server identity.
    pub async fn info(&self) -> Result<String> {
        let url = format!("{}/emby/System/Info", self.base_url);
        let response = self.http.execute(self.request(HttpRequest::get(url))).await?;
        if !response.is_success() {
            return Err(EmbyError::Status(response.status));
        }
        let system: SystemInfo = response
            .json()
            .map_err(|e| EmbyError::Malformed(e.to_string()))?;
        Ok(format!("{} {}", system.server_name, system.version))
    }
}

#[async_trait]
impl MediaLibrary for EmbyClient {
    async fn search(&self, name: &str) -> core_sync::Result<Option<String>> {
        let url = format!(
            "{}/emby/Items?IncludeItemTypes=Series&Recursive=true&SearchTerm={}",
            self.base_url,
            urlencoding::encode(name),
        );
        let response = self
            .http
            .execute(self.request(HttpRequest::get(url)))
            .await
            .map_err(EmbyError::from)?;
        if !response.is_success() {
            return Err(EmbyError::Status(response.status).into());
        }
        let page: ItemsPage = response
            .json()
            .map_err(|e| EmbyError::Malformed(e.to_string()))?;

        match page.items.into_iter().next() {
            Some(item) => {
                debug!(name = %name, id = %item.id, matched = %item.name, "Library search hit");
                Ok(Some(item.id))
            }
            None => Ok(None),
        }
    }

    async fn refresh(&self, id: &str) -> core_sync::Result<bool> {
        let url = format!(
            "{}/emby/Items/{}/Refresh?Recursive=true&MetadataRefreshMode=FullRefresh&ReplaceAllMetadata=false",
            self.base_url, id,
        );
        let response = self
            .http
            .execute(self.request(HttpRequest::post(url)))
            .await
            .map_err(EmbyError::from)?;
        if response.is_success() {
            info!(id = %id, "Requested library refresh");
        }
        Ok(response.is_success())
    }
}
