use anyhow::{Result, anyhow};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Manages on-disk blobs for uploaded media.
///
/// Each object is stored as a single flat file at `{dir}/{object_id}`.
/// Access rules live in the database; this layer only moves bytes.
pub struct MediaStorage {
    dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub size: u64,
    pub sha256: String,
}

impl MediaStorage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Path to the file for a given object. Ids must be UUIDs so a caller
    /// can never escape the storage directory.
    pub fn object_path(&self, object_id: &str) -> Result<PathBuf> {
        let id: Uuid = object_id
            .parse()
            .map_err(|_| anyhow!("invalid object id: {}", object_id))?;
        Ok(self.dir.join(id.to_string()))
    }

    /// Write the object's bytes, replacing any previous content.
    ///
    /// Data goes to a temp file first and is renamed into place, so readers
    /// never observe a half-written object.
    pub async fn write_object(&self, object_id: &str, data: &[u8]) -> Result<StoredObject> {
        let path = self.object_path(object_id)?;
        let tmp = path.with_extension("part");

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;

        let mut hasher = Sha256::new();
        hasher.update(data);

        Ok(StoredObject {
            size: data.len() as u64,
            sha256: hex::encode(hasher.finalize()),
        })
    }

    /// Read a whole object. `Ok(None)` when nothing is stored under the id.
    pub async fn read_object(&self, object_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.object_path(object_id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_object(&self, object_id: &str) -> Result<()> {
        let path = self.object_path(object_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted media object {}", object_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Media object {} already gone", object_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
