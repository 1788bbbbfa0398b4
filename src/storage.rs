//! Disk-backed blob store for admin image uploads. Files land under a
//! random UUID key and are served back through the public `/uploads` path.

use std::path::Path;

use anyhow::Result;
use tokio::fs;
use uuid::Uuid;

/// Stores an uploaded image and returns its retrieval URL.
pub async fn store_image(
    upload_dir: &str,
    public_base_url: &str,
    original_name: Option<&str>,
    bytes: &[u8],
) -> Result<String> {
    let key = Uuid::new_v4();
    let file_name = match extension_of(original_name) {
        Some(ext) => format!("{key}.{ext}"),
        None => key.to_string(),
    };

    fs::create_dir_all(upload_dir).await?;
    let path = Path::new(upload_dir).join(&file_name);
    fs::write(&path, bytes).await?;

    tracing::debug!(file = %file_name, size = bytes.len(), "stored upload");
    Ok(format!(
        "{}/uploads/{file_name}",
        public_base_url.trim_end_matches('/')
    ))
}

fn extension_of(original_name: Option<&str>) -> Option<String> {
    let name = original_name?;
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_bytes_under_a_fresh_key() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let dir = dir.to_string_lossy().to_string();

        let url = store_image(&dir, "http://localhost:3000/", Some("cat.PNG"), b"img").await?;
        assert!(url.starts_with("http://localhost:3000/uploads/"));
        assert!(url.ends_with(".png"));

        let file_name = url.rsplit('/').next().unwrap();
        let on_disk = fs::read(Path::new(&dir).join(file_name)).await?;
        assert_eq!(on_disk, b"img");

        fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[test]
    fn suspicious_extensions_are_dropped() {
        assert_eq!(extension_of(Some("a.png")), Some("png".to_string()));
        assert_eq!(extension_of(Some("a.p/ng")), None);
        assert_eq!(extension_of(Some("noext")), None);
        assert_eq!(extension_of(None), None);
    }
}
