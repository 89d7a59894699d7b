use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::gateway::Gateway;
use crate::merge::merge;
use crate::record::CameraRecord;
use crate::store::StoreError;

pub const SETTINGS_FILE: &str = "sync-settings.json";
const GIST_API: &str = "https://api.github.com/gists";
const GIST_DOCUMENT: &str = "cameras.json";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cloud sync is not configured: set a token and a gist id first")]
    NotConfigured,
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote store rejected the request: {0}")]
    RemoteRejected(reqwest::StatusCode),
    #[error("malformed remote snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Credentials for the remote document store. Both fields must be present
/// before a sync attempt; absence short-circuits without touching anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    pub token: String,
    pub gist_id: String,
}

impl SyncSettings {
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty() && !self.gist_id.trim().is_empty()
    }

    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = settings_path(data_dir.as_ref());
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, data_dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(settings_path(dir), serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

/// The two operations the reconciliation engine needs from a remote document
/// store. The transport behind them is interchangeable.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, settings: &SyncSettings) -> Result<Vec<CameraRecord>, SyncError>;
    async fn update(
        &self,
        settings: &SyncSettings,
        records: &[CameraRecord],
    ) -> Result<(), SyncError>;
}

/// GitHub-gist-backed remote store: the roster lives as one JSON file inside
/// a private gist.
pub struct GistStore {
    client: reqwest::Client,
}

impl GistStore {
    pub fn new() -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent("camwatch")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[derive(Deserialize)]
struct GistResponse {
    files: std::collections::HashMap<String, GistFile>,
}

#[derive(Deserialize)]
struct GistFile {
    content: String,
}

#[async_trait]
impl RemoteStore for GistStore {
    async fn fetch(&self, settings: &SyncSettings) -> Result<Vec<CameraRecord>, SyncError> {
        let url = format!("{GIST_API}/{}", settings.gist_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&settings.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::RemoteRejected(response.status()));
        }

        let gist: GistResponse = response.json().await?;
        match gist.files.get(GIST_DOCUMENT) {
            Some(file) => Ok(serde_json::from_str(&file.content)?),
            None => {
                // Fresh gist with no roster yet: same as an empty snapshot.
                warn!("gist has no {GIST_DOCUMENT} file, treating remote as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn update(
        &self,
        settings: &SyncSettings,
        records: &[CameraRecord],
    ) -> Result<(), SyncError> {
        let url = format!("{GIST_API}/{}", settings.gist_id);
        let body = serde_json::json!({
            "files": {
                GIST_DOCUMENT: { "content": serde_json::to_string_pretty(records)? }
            }
        });

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&settings.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::RemoteRejected(response.status()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub local_count: usize,
    pub remote_count: usize,
    pub merged_count: usize,
}

/// One manual sync pass: fetch the remote snapshot, merge, push the merged
/// roster back, then persist it locally.
///
/// All-or-nothing on the local side: any fetch or push failure returns before
/// the gateway is touched, so a failed sync leaves local state exactly as it
/// was.
pub async fn sync_once<R: RemoteStore>(
    gateway: &mut Gateway,
    remote: &R,
    settings: &SyncSettings,
) -> Result<SyncReport, SyncError> {
    if !settings.is_configured() {
        return Err(SyncError::NotConfigured);
    }

    let local = gateway.snapshot();
    let fetched = remote.fetch(settings).await?;
    let merged = merge(&local, &fetched);

    remote.update(settings, &merged).await?;

    let report = SyncReport {
        local_count: local.len(),
        remote_count: fetched.len(),
        merged_count: merged.len(),
    };
    gateway.replace_all(merged)?;

    info!(
        local = report.local_count,
        remote = report.remote_count,
        merged = report.merged_count,
        "cloud sync complete"
    );
    Ok(report)
}
