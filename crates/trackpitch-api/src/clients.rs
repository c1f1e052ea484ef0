//! HTTP clients for the collaborating services.
//!
//! The track and catalog services expose internal, gateway-only endpoints
//! for existence checks. Each client binds the corresponding core trait to
//! plain `reqwest` calls; an upstream 404 is a domain-visible `NotFound`,
//! everything else a transport failure.

use serde::Deserialize;
use trackpitch_core::lookup::{
    CatalogDirectory, CatalogItemSummary, LookupError, TrackDirectory, TrackSummary,
};
use trackpitch_core::publish::{PublishError, PublishSink};
use uuid::Uuid;

fn upstream(error: reqwest::Error) -> LookupError {
    LookupError::Upstream(error.to_string())
}

/// Track service client.
#[derive(Debug, Clone)]
pub struct HttpTrackDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTrackDirectory {
    /// Creates a client against the given track service base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackResponse {
    title: String,
}

#[async_trait::async_trait]
impl TrackDirectory for HttpTrackDirectory {
    async fn track_by_id(
        &self,
        track_id: Uuid,
        artist_id: Uuid,
    ) -> Result<TrackSummary, LookupError> {
        let url = format!("{}/internal/track/{artist_id}/{track_id}", self.base_url);
        let response = self.client.get(&url).send().await.map_err(upstream)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }
        let body: TrackResponse = response
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;
        Ok(TrackSummary { title: body.title })
    }
}

/// Catalog service client.
#[derive(Debug, Clone)]
pub struct HttpCatalogDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogDirectory {
    /// Creates a client against the given catalog service base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogItemResponse {
    name: String,
}

#[async_trait::async_trait]
impl CatalogDirectory for HttpCatalogDirectory {
    async fn catalog_item_by_id(
        &self,
        catalog_item_id: Uuid,
        curator_user_id: Uuid,
    ) -> Result<CatalogItemSummary, LookupError> {
        let url = format!(
            "{}/internal/playlist/{curator_user_id}/{catalog_item_id}",
            self.base_url
        );
        let response = self.client.get(&url).send().await.map_err(upstream)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }
        let body: CatalogItemResponse = response
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;
        Ok(CatalogItemSummary { name: body.name })
    }
}

/// Webhook publish sink used by the outbox relay: each relayed event is
/// POSTed as `{"eventType": ..., "payload": ...}` to a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpPublishSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPublishSink {
    /// Creates a sink delivering to the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait::async_trait]
impl PublishSink for HttpPublishSink {
    async fn publish(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), PublishError> {
        let envelope = serde_json::json!({
            "eventType": event_type,
            "payload": payload,
        });
        self.client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        Ok(())
    }
}
