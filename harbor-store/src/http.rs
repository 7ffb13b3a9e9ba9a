//! HTTP implementation of [`RemoteStore`]
//!
//! Talks to the store daemon's local HTTP API. Authentication is
//! password-only basic auth, and every request carries a configurable
//! user agent and timeout.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::client::RemoteStore;
use crate::errors::{Result, StoreError};
use crate::path::RemotePath;
use crate::types::{DirectoryHealth, RedundancyConfig, RemoteFile};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct FilesResponse {
    files: Vec<RemoteFile>,
}

pub struct HttpStore {
    client: Client,
    base: String,
    password: Option<String>,
}

impl HttpStore {
    pub fn new(addr: &str, password: Option<String>, agent: &str) -> Result<Self> {
        Self::with_timeout(addr, password, agent, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        addr: &str,
        password: Option<String>,
        agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(agent.to_string())
            .timeout(timeout)
            .build()?;
        let base = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", addr.trim_end_matches('/'))
        };
        Ok(Self {
            client,
            base,
            password,
        })
    }

    fn url(&self, endpoint: &str, path: &RemotePath) -> String {
        format!("{}/{}/{}", self.base, endpoint, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.password {
            Some(password) => builder.basic_auth("", Some(password)),
            None => builder,
        }
    }

    async fn check(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn upload_file(
        &self,
        local: &Path,
        remote: &RemotePath,
        redundancy: &RedundancyConfig,
    ) -> Result<()> {
        let source = local
            .to_str()
            .ok_or_else(|| StoreError::InvalidPath(local.display().to_string()))?;
        debug!(source, remote = %remote, "uploading file");
        let request = self
            .client
            .post(self.url("upload", remote))
            .query(&[("source", source)])
            .query(&[
                ("datapieces", redundancy.data_pieces),
                ("paritypieces", redundancy.parity_pieces),
            ]);
        let response = self.authed(request).send().await?;
        self.check(response).await?;
        Ok(())
    }

    async fn delete_file(&self, remote: &RemotePath) -> Result<()> {
        debug!(remote = %remote, "deleting file");
        let request = self.client.post(self.url("delete", remote));
        let response = self.authed(request).send().await?;
        self.check(response).await?;
        Ok(())
    }

    async fn list_files(&self, prefix: Option<&RemotePath>) -> Result<Vec<RemoteFile>> {
        let request = self.client.get(format!("{}/files", self.base));
        let response = self.authed(request).send().await?;
        let listing: FilesResponse = self.check(response).await?.json().await?;
        let files = match prefix {
            Some(prefix) => listing
                .files
                .into_iter()
                .filter(|f| f.path.starts_with(prefix))
                .collect(),
            None => listing.files,
        };
        Ok(files)
    }

    async fn directory_health(&self, remote: &RemotePath) -> Result<DirectoryHealth> {
        let request = self.client.get(self.url("dir", remote));
        let response = self.authed(request).send().await?;
        let health: DirectoryHealth = self.check(response).await?.json().await?;
        Ok(health)
    }

    async fn rename(&self, from: &RemotePath, to: &RemotePath) -> Result<()> {
        debug!(from = %from, to = %to, "renaming path");
        let request = self
            .client
            .post(self.url("rename", from))
            .query(&[("newpath", to.as_str())]);
        let response = self.authed(request).send().await?;
        self.check(response).await?;
        Ok(())
    }

    async fn file_exists(&self, remote: &RemotePath) -> Result<bool> {
        let request = self.client.get(self.url("file", remote));
        let response = self.authed(request).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        self.check(response).await?;
        Ok(true)
    }
}
