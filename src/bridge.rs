use std::path::PathBuf;
use std::sync::Arc;
use std::{fs, io};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};

use crate::error::BridgeError;

/// The host application this core is embedded in: submission, fixture
/// configuration, and artifact persistence.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Submit a serialised artifact for upload.
    async fn send_artifact(&self, json: &str) -> Result<(), BridgeError>;

    /// Scripted-fix override configured on the host. `None` or blank means
    /// record from the live feed.
    fn get_fixture_list(&self) -> Option<String>;

    async fn save_artifact(&self, json: &str) -> Result<(), BridgeError>;

    async fn load_artifact(&self) -> Result<Option<String>, BridgeError>;
}

/// File-backed artifact store, used when the host bridge cannot persist or
/// load.
pub struct LocalArtifactStore {
    path: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create artifact directory {}", parent.display())
            })?;
        }
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write artifact to {}", self.path.display()))
    }

    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| {
                format!("failed to read artifact from {}", self.path.display())
            }),
        }
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).context("failed to clear stored artifact"),
        }
    }
}

/// Bridge-first persistence with the local file store behind it. A failed
/// submission must never lose the artifact, so saves always land somewhere.
pub struct ArtifactRepository {
    bridge: Arc<dyn HostBridge>,
    store: LocalArtifactStore,
}

impl ArtifactRepository {
    pub fn new(bridge: Arc<dyn HostBridge>, store: LocalArtifactStore) -> Self {
        Self { bridge, store }
    }

    pub async fn persist(&self, json: &str) {
        match self.bridge.save_artifact(json).await {
            Ok(()) => info!("artifact persisted via host bridge"),
            Err(err) => {
                warn!("host bridge persist failed ({err}), using local store");
                if let Err(store_err) = self.store.save(json) {
                    warn!("local artifact store failed too: {store_err:#}");
                }
            }
        }
    }

    pub async fn load(&self) -> Option<String> {
        match self.bridge.load_artifact().await {
            Ok(Some(json)) => return Some(json),
            Ok(None) => {}
            Err(err) => warn!("host bridge load failed ({err}), trying local store"),
        }
        match self.store.load() {
            Ok(found) => found,
            Err(err) => {
                warn!("local artifact store load failed: {err:#}");
                None
            }
        }
    }
}
