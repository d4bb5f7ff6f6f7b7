//! Full-resolution snapshot saving.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// `full_jpeg_<local timestamp>.jpg`, millisecond precision so rapid captures don't collide.
pub fn snapshot_file_name(at: DateTime<Local>) -> String {
    format!("full_jpeg_{}.jpg", at.format("%Y-%m-%dT%H-%M-%S%.3f"))
}

/// Write `bytes` into `dir` and return the saved path. Existing files are never overwritten.
pub fn save_snapshot(dir: &Path, bytes: &[u8], at: DateTime<Local>) -> Result<PathBuf> {
    if bytes.is_empty() {
        bail!("snapshot response was empty");
    }
    if !bytes.starts_with(&JPEG_MAGIC) {
        bail!("snapshot response is not a JPEG ({} bytes)", bytes.len());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create snapshot dir {}", dir.display()))?;

    let name = snapshot_file_name(at);
    let mut path = dir.join(&name);
    let mut suffix = 1;
    while path.exists() {
        let stem = name.trim_end_matches(".jpg");
        path = dir.join(format!("{stem}_{suffix}.jpg"));
        suffix += 1;
    }
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::env;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, 21, 4, 5)
            .single()
            .expect("unambiguous local time")
    }

    fn temp_dir(name: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        env::temp_dir().join(format!("solvecam-snap-{name}-{stamp}"))
    }

    #[test]
    fn file_name_uses_timestamp() {
        assert_eq!(
            snapshot_file_name(fixed_time()),
            "full_jpeg_2024-03-09T21-04-05.000.jpg"
        );
    }

    #[test]
    fn saves_and_never_overwrites() {
        let dir = temp_dir("save");
        let bytes = [0xFF, 0xD8, 0x01, 0xFF, 0xD9];
        let first = save_snapshot(&dir, &bytes, fixed_time()).expect("first save");
        let second = save_snapshot(&dir, &bytes, fixed_time()).expect("second save");
        assert_ne!(first, second);
        assert!(second
            .to_string_lossy()
            .ends_with("full_jpeg_2024-03-09T21-04-05.000_1.jpg"));
        assert_eq!(fs::read(&first).unwrap(), bytes);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_non_jpeg_payloads() {
        let dir = temp_dir("reject");
        assert!(save_snapshot(&dir, b"", fixed_time()).is_err());
        assert!(save_snapshot(&dir, b"<html>", fixed_time()).is_err());
        assert!(!dir.exists());
    }
}
