//! Castle project-lookup client.
//!
//! The Castle directory has no search endpoint, only lookup by id; the
//! scanner hammers this client with random candidates. Every failure mode
//! (404, non-2xx, network error, malformed body, missing name) collapses to
//! `None`, meaning "no project at this id" — a single lookup is never fatal
//! to a scan.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::core::scanner::{ProjectHit, ProjectLookup};

const USER_AGENT: &str = "CastleBot/1.0 (Discord)";

/// Project lookup over the Castle HTTP API.
#[derive(Debug, Clone)]
pub struct CastleClient {
    http: reqwest::Client,
    api_base: String,
    web_base: String,
}

impl CastleClient {
    /// Creates a lookup client. `api_base` serves the JSON endpoint;
    /// `web_base` builds the user-facing project links.
    #[must_use]
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, web_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            web_base: web_base.into(),
        }
    }
}

#[async_trait]
impl ProjectLookup for CastleClient {
    async fn lookup(&self, id: &str) -> Option<ProjectHit> {
        let api_url = format!("{}/projects/{id}", self.api_base);
        let web_url = format!("{}/d/{id}", self.web_base);

        let response = self
            .http
            .get(&api_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let data: Value = response.json().await.ok()?;
        let name = data.get("name")?.as_str()?;
        debug!(%id, %name, "castle lookup hit");

        Some(ProjectHit {
            name: name.to_string(),
            url: web_url,
        })
    }
}
