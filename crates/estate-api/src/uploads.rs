use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// 5 MB limit for profile pictures
pub const MAX_PROFILE_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Local directory that holds uploaded images, served back under `/uploads`.
#[derive(Debug, Clone)]
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    pub async fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create uploads directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the image to disk and return the stored file name.
    pub async fn save_profile_picture(
        &self,
        content_type: &str,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        let ext = original_name
            .and_then(extension_of)
            .or_else(|| extension_for(content_type))
            .unwrap_or("img");
        let name = format!("profilePicture-{}.{}", Uuid::new_v4(), ext);
        let path = self.dir.join(&name);

        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create file {}", path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("Failed to write file {}", path.display()))?;
        file.flush().await?;

        debug!("Stored profile picture {} ({} bytes)", name, bytes.len());
        Ok(name)
    }

    /// Best-effort delete; a missing file is not an error.
    pub async fn remove(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove upload {}: {}", name, e);
            }
        }
    }
}

pub fn is_image(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().starts_with("image/")
}

fn extension_of(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    let sane = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    sane.then_some(ext)
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}
