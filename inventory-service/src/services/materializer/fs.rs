//! Owner-only file writes for task scratch space.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub const PRIVATE_DIR_MODE: u32 = 0o700;
pub const PRIVATE_FILE_MODE: u32 = 0o600;

pub async fn ensure_private_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    set_permissions(path, PRIVATE_DIR_MODE).await
}

/// Write `bytes` to `path` readable only by the owner. The content is flushed
/// to disk before the file appears under its final name.
pub async fn write_private_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_path_for(path);

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(PRIVATE_FILE_MODE);

    let written = async {
        let mut file = options.open(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        set_permissions(&temp_path, PRIVATE_FILE_MODE).await?;
        tokio::fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }
    set_permissions(path, PRIVATE_FILE_MODE).await
}

pub async fn set_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("tmp");
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
}
