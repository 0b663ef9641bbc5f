//! Google Cloud Storage download over the JSON API

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::info;

use super::{ObjectLocation, ObjectStore};

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
const EMULATOR_ENV: &str = "STORAGE_EMULATOR_HOST";
const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Blocking client for `storage/v1` object media downloads
pub struct GcsStore {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl GcsStore {
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Endpoint from `STORAGE_EMULATOR_HOST` (if set), token from
    /// `GOOGLE_OAUTH_ACCESS_TOKEN` (if set)
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var(EMULATOR_ENV).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::new(endpoint, token)
    }

    /// Media download URL for an object
    pub fn object_url(&self, location: &ObjectLocation) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.endpoint,
            urlencoding::encode(&location.bucket),
            urlencoding::encode(&location.key)
        )
    }
}

impl ObjectStore for GcsStore {
    fn download(&self, location: &ObjectLocation, dest: &Path) -> Result<u64> {
        let url = self.object_url(location);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        if let Some(project) = &location.project_id {
            request = request.header("x-goog-user-project", project);
        }

        let mut response = request
            .send()
            .with_context(|| format!("Request for gs://{} failed", location))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!(
                "Download of gs://{} failed with status {}: {}",
                location,
                status,
                body.trim()
            );
        }

        let mut file = File::create(dest)
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;
        let bytes = response
            .copy_to(&mut file)
            .with_context(|| format!("Failed to write object body to {}", dest.display()))?;

        info!("Fetched {} bytes from gs://{}", bytes, location);
        Ok(bytes)
    }
}
