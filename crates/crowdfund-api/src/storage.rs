use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// URL prefix the storage directory is mounted under.
pub const PUBLIC_PREFIX: &str = "images";

/// On-disk storage for avatars and campaign images.
///
/// Files are stored flat as `{dir}/{owner_id}-{uuid}-{file name}` and
/// referenced by their public path `images/{owner_id}-{uuid}-{file name}`.
/// Every save gets a fresh name, so earlier uploads are never overwritten.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store bytes and return the public path to record in the database.
    pub async fn save(&self, owner_id: i64, original_name: &str, bytes: &[u8]) -> Result<String> {
        let file_name = format!(
            "{}-{}-{}",
            owner_id,
            Uuid::new_v4().simple(),
            sanitize_file_name(original_name)
        );
        fs::write(self.dir.join(&file_name), bytes).await?;
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }
}

/// Keep only the final path component, restricted to a safe character set.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
