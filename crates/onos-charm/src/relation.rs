//! Relation data publishing

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use log::{debug, info};
use thiserror::Error;

use crate::host::{HookTools, HostError};

#[derive(Debug, Error)]
pub enum RelationError {
    #[error("Hook tool error: {0}")]
    Host(#[from] HostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Write application data on every relation of `endpoint`. Empty values
    /// remove the key. Returns the number of relations written.
    async fn publish_app_data(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<usize, RelationError>;
}

/// Relation data written through `relation-set`
pub struct HookToolRelationStore {
    tools: HookTools,
}

impl HookToolRelationStore {
    pub fn new(tools: HookTools) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl RelationStore for HookToolRelationStore {
    async fn publish_app_data(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<usize, RelationError> {
        // application data may only be written by the leader
        if !self.tools.is_leader().await? {
            debug!("Not the leader, leaving {} application data alone", endpoint);
            return Ok(0);
        }

        let ids = self.tools.relation_ids(endpoint).await?;
        for id in &ids {
            self.tools.relation_set(id, fields, true).await?;
        }

        info!("Updated application data on {} {} relation(s)", ids.len(), endpoint);
        Ok(ids.len())
    }
}

/// Relation data kept in a JSON file, keyed by endpoint
pub struct FileRelationStore {
    path: PathBuf,
}

impl FileRelationStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn read(&self) -> Result<BTreeMap<String, BTreeMap<String, String>>, RelationError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RelationStore for FileRelationStore {
    async fn publish_app_data(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<usize, RelationError> {
        let mut all = self.read().await?;
        let data = all.entry(endpoint.to_string()).or_default();
        for (key, value) in fields {
            if value.is_empty() {
                data.remove(key);
            } else {
                data.insert(key.clone(), value.clone());
            }
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&all)?).await?;
        Ok(1)
    }
}

/// In-memory store recording every publication
#[derive(Default)]
pub struct MockRelationStore {
    published: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.published
            .lock()
            .map(|published| published.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RelationStore for MockRelationStore {
    async fn publish_app_data(
        &self,
        endpoint: &str,
        fields: &[(String, String)],
    ) -> Result<usize, RelationError> {
        if let Ok(mut published) = self.published.lock() {
            published.push((endpoint.to_string(), fields.to_vec()));
        }
        Ok(1)
    }
}
