//! Session store backed by an ADK-compatible agent server
//!
//! Sessions are created with
//! `POST {base}/apps/{app}/users/{user}/sessions/{session_id}`. Servers answer
//! an existing id either with 409 or with 400 and an "already exists" detail;
//! both map to [`SessionCreation::AlreadyExists`].

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;

use super::{SessionCreation, SessionStore};
use crate::agents::config::RemoteRuntimeConfig;
use crate::agents::domain::SessionKey;
use crate::agents::error::{SessionStoreError, SessionStoreResult};
use crate::agents::http::{endpoint_url, parse_base_url};

/// Remote session store
pub struct RemoteSessionStore {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteSessionStore {
    pub fn new(config: &RemoteRuntimeConfig) -> SessionStoreResult<Self> {
        let base_url = parse_base_url(&config.base_url).map_err(SessionStoreError::InvalidUrl)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, base_url })
    }

    fn session_url(&self, key: &SessionKey) -> SessionStoreResult<Url> {
        endpoint_url(
            &self.base_url,
            &[
                "apps",
                key.app_name.as_str(),
                "users",
                key.user_id.as_str(),
                "sessions",
                key.session_id.as_str(),
            ],
        )
        .map_err(SessionStoreError::InvalidUrl)
    }
}

fn is_already_exists(status: StatusCode, body: &str) -> bool {
    status == StatusCode::CONFLICT
        || (status == StatusCode::BAD_REQUEST && body.to_ascii_lowercase().contains("already exists"))
}

#[async_trait]
impl SessionStore for RemoteSessionStore {
    async fn create_if_absent(&self, key: &SessionKey) -> SessionStoreResult<SessionCreation> {
        let response = self
            .client
            .post(self.session_url(key)?)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(SessionCreation::Created);
        }

        let body = response.text().await.unwrap_or_default();
        if is_already_exists(status, &body) {
            Ok(SessionCreation::AlreadyExists)
        } else {
            Err(SessionStoreError::Backend {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}
