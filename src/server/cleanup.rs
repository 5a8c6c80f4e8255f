//! Expiry of per-request output directories

use std::path::Path;
use std::time::{Duration, SystemTime};
use log::{debug, info, warn};
use uuid::Uuid;
use crate::error::Result;

/// Remove request directories under `output_dir` last modified more than
/// `max_age` before `now`. Returns how many were removed.
///
/// Only entries named like a request id are touched; anything else in the
/// output directory is left alone.
pub async fn sweep_expired(output_dir: &Path, max_age: Duration, now: SystemTime) -> Result<usize> {
    let mut read_dir = match tokio::fs::read_dir(output_dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if Uuid::parse_str(name).is_err() {
            continue;
        }

        let Ok(metadata) = entry.metadata().await else { continue };
        if !metadata.is_dir() {
            continue;
        }
        let Ok(modified) = metadata.modified() else { continue };
        let expired = now
            .duration_since(modified)
            .map(|age| age > max_age)
            .unwrap_or(false);
        if !expired {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => {
                debug!("Removed expired outputs {}", name);
                removed += 1;
            }
            Err(e) => warn!("Cannot remove expired outputs {}: {}", name, e),
        }
    }

    if removed > 0 {
        info!("Removed {} expired request directories", removed);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweep_removes_only_old_request_dirs() {
        let dir = TempDir::new().unwrap();
        let request = dir.path().join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&request).unwrap();
        std::fs::write(request.join("converted_a.wav"), b"x").unwrap();
        let other = dir.path().join("keep-me");
        std::fs::create_dir_all(&other).unwrap();
        let stray = dir.path().join(Uuid::new_v4().to_string() + ".wav");
        std::fs::write(&stray, b"x").unwrap();

        let max_age = Duration::from_secs(60);

        // Fresh directories survive.
        assert_eq!(sweep_expired(dir.path(), max_age, SystemTime::now()).await.unwrap(), 0);
        assert!(request.exists());

        let later = SystemTime::now() + Duration::from_secs(3600);
        assert_eq!(sweep_expired(dir.path(), max_age, later).await.unwrap(), 1);
        assert!(!request.exists());
        assert!(other.exists());
        assert!(stray.exists());
    }

    #[tokio::test]
    async fn test_sweep_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nothing-here");
        let removed = sweep_expired(&missing, Duration::ZERO, SystemTime::now()).await.unwrap();
        assert_eq!(removed, 0);
    }
}
