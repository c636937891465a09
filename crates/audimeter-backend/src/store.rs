//! Active configuration store with non-volatile persistence.
//!
//! The live config is published on a watch channel: every reader gets a
//! cheap point-in-time snapshot, and the supervisor is the only writer.
//! Persistence is one opaque binary blob per key; loading swallows every
//! failure and falls back to the defaults, because the device has to keep
//! measuring even with corrupt stored preferences.

use std::path::PathBuf;
use std::sync::Arc;

use audimeter_bridge::config::{AudioConfig, ConfigError, MenuItem, ParamUpdate};
use directories::ProjectDirs;
use tokio::{
    fs::{OpenOptions, create_dir_all},
    io::AsyncWriteExt,
    sync::watch,
};

/// Storage key of the persisted config image.
pub const CONFIG_BLOB_KEY: &str = "audio_config";

/// Errors that can occur while persisting or recalling blobs.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to determine the user's data directories. This usually
    /// occurs when required environment variables are missing (e.g.,
    /// `$HOME` on Unix).
    #[error("failed to obtain user's directories")]
    DirectoriesNotFound,
    /// An I/O error occurred while reading or writing a blob.
    #[error("failed to access non-volatile storage: {0}")]
    Io(#[from] std::io::Error),
    /// The blob image could not be encoded or decoded.
    #[error("failed to encode or decode blob: {0}")]
    Codec(#[from] bincode::Error),
}

/// Key-addressed binary blobs on disk, the host stand-in for the
/// device's non-volatile storage.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Opens the default per-user storage directory.
    pub fn open() -> Result<Self, StoreError> {
        match ProjectDirs::from("com", "audimeter", "audimeter") {
            Some(dirs) => Ok(Self {
                root: dirs.data_dir().to_path_buf(),
            }),
            None => Err(StoreError::DirectoriesNotFound),
        }
    }

    /// Opens storage rooted at an explicit path.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.blob"))
    }

    /// Writes one blob, replacing any previous image under the key.
    pub async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        create_dir_all(&self.root).await?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.blob_path(key))
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Reads the blob stored under the key.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        Ok(tokio::fs::read(self.blob_path(key)).await?)
    }
}

#[derive(Debug)]
struct StoreInner {
    config: watch::Sender<AudioConfig>,
    blobs: BlobStore,
}

/// Shared handle to the active [`AudioConfig`].
///
/// Mutations swap in a whole validated snapshot, so a window already in
/// flight keeps the parameters that were active when its acquisition
/// started; the change shows up on the next capture cycle.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    inner: Arc<StoreInner>,
}

impl ConfigStore {
    /// Creates a store with the default config, backed by `blobs`.
    pub fn new(blobs: BlobStore) -> Self {
        let (config, _) = watch::channel(AudioConfig::default());
        Self {
            inner: Arc::new(StoreInner { config, blobs }),
        }
    }

    /// Subscribes for cheap read-mostly snapshots of the live config.
    pub fn subscribe(&self) -> watch::Receiver<AudioConfig> {
        self.inner.config.subscribe()
    }

    /// Current config snapshot.
    pub fn snapshot(&self) -> AudioConfig {
        *self.inner.config.borrow()
    }

    /// Applies one validated single-field mutation.
    pub fn set(&self, update: ParamUpdate) -> Result<(), ConfigError> {
        let candidate = self.snapshot().with_update(update)?;
        self.inner.config.send_replace(candidate);
        Ok(())
    }

    /// Advances the parameter behind a menu item to its next allowed
    /// value. Steppers only produce in-range values, so this cannot fail.
    pub fn advance(&self, item: MenuItem) {
        let mut candidate = self.snapshot();
        candidate.advance(item);
        self.inner.config.send_replace(candidate);
    }

    /// Overwrites the preset-controlled fields for a quality level.
    pub fn apply_preset(&self, level: u8) -> Result<(), ConfigError> {
        let mut candidate = self.snapshot();
        candidate.apply_preset(level)?;
        self.inner.config.send_replace(candidate);
        Ok(())
    }

    /// Persists the current config as its exact binary image.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let image = bincode::serialize(&self.snapshot())?;
        self.inner.blobs.write(CONFIG_BLOB_KEY, &image).await?;
        log::info!("configuration persisted");
        Ok(())
    }

    /// Recalls the persisted config if a readable, in-range image exists.
    ///
    /// Every failure mode degrades to the defaults already in the store.
    pub async fn load(&self) {
        let bytes = match self.inner.blobs.read(CONFIG_BLOB_KEY).await {
            Ok(bytes) => bytes,
            Err(_) => {
                log::info!("no stored configuration, using defaults");
                return;
            }
        };
        match bincode::deserialize::<AudioConfig>(&bytes) {
            Ok(config) if config.validate().is_ok() => {
                self.inner.config.send_replace(config);
                log::info!("configuration loaded from non-volatile storage");
            }
            Ok(_) => log::warn!("stored configuration out of range, using defaults"),
            Err(error) => log::warn!("stored configuration unreadable, using defaults: {error}"),
        }
    }
}
