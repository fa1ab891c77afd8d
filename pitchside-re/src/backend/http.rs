//! HTTP client for the league backend API
//!
//! Endpoints (relative to `backend.base_url`):
//! - `GET  /scopes/{scope}/roster`
//! - `GET  /scopes/{scope}/ratings`
//! - `POST /scopes/{scope}/members/{id}/rating` with `{skillRating, physicalRating}`
//! - `GET  /members/{id}/rating-history`

use super::{AuditHistory, PersistenceError, RatingSource, RatingSubmitter, RosterSource};
use crate::error::{Error, Result};
use crate::model::{AuditEntry, RatingRecord, RosterMember};
use async_trait::async_trait;
use pitchside_common::config::BackendSettings;
use pitchside_common::MemberId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRatingBody {
    skill_rating: u8,
    physical_rating: u8,
}

/// reqwest-backed implementation of every backend port
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    scope: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            scope: settings.scope.clone(),
            api_token: settings.api_token.clone(),
        })
    }

    fn scope_url(&self, path: &str) -> String {
        format!("{}/scopes/{}/{}", self.base_url, self.scope, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::Backend(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Backend(format!("GET {} returned {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Backend(format!("GET {}: invalid body: {}", url, e)))
    }
}

#[async_trait]
impl RosterSource for HttpBackend {
    async fn roster(&self) -> Result<Vec<RosterMember>> {
        self.get_json(self.scope_url("roster")).await
    }
}

#[async_trait]
impl RatingSource for HttpBackend {
    async fn ratings(&self) -> Result<Vec<RatingRecord>> {
        self.get_json(self.scope_url("ratings")).await
    }
}

#[async_trait]
impl RatingSubmitter for HttpBackend {
    async fn submit(
        &self,
        member_id: MemberId,
        skill_rating: u8,
        physical_rating: u8,
    ) -> std::result::Result<(), PersistenceError> {
        let url = self.scope_url(&format!("members/{}/rating", member_id));
        debug!("POST {}", url);

        let response = self
            .authorized(self.client.post(&url))
            .json(&SubmitRatingBody {
                skill_rating,
                physical_rating,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PersistenceError::Timeout
                } else {
                    PersistenceError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(PersistenceError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AuditHistory for HttpBackend {
    async fn history(&self, member_id: MemberId) -> Result<Vec<AuditEntry>> {
        self.get_json(format!(
            "{}/members/{}/rating-history",
            self.base_url, member_id
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_url_strips_trailing_slash() {
        let settings = BackendSettings {
            base_url: "https://league.example.com/api/".to_string(),
            scope: "season-2026".to_string(),
            request_timeout_ms: 1000,
            api_token: None,
        };
        let backend = HttpBackend::new(&settings).unwrap();
        assert_eq!(
            backend.scope_url("roster"),
            "https://league.example.com/api/scopes/season-2026/roster"
        );
    }
}
