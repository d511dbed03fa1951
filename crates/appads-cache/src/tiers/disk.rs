//! On-disk cache tier: one file per key, atomic writes, periodic cleanup (§4.3, §6).

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CacheError;

/// Values larger than this many bytes (serialised) are gzip-compressed
/// before being written to disk.
const COMPRESS_THRESHOLD_BYTES: usize = 10 * 1024;

/// On-disk payload envelope: `{expiry: <unix-ms>, value: <json>}`.
#[derive(Debug, Serialize, Deserialize)]
struct DiskPayload {
    expiry: i64,
    value: Value,
}

/// File-per-key on-disk cache tier.
pub struct DiskTier {
    cache_dir: PathBuf,
}

impl DiskTier {
    /// Point the tier at `cache_dir`, creating it if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn path_for(&self, key: &str, gzip: bool) -> PathBuf {
        let mut hasher = Md5::new();
        hasher.update(key.as_bytes());
        let digest = hex::encode(hasher.finalize());
        let ext = if gzip { "json.gz" } else { "json" };
        self.cache_dir.join(format!("{digest}.{ext}"))
    }

    /// Read a value, returning `None` if absent, expired, or corrupted.
    /// Expired or corrupted files are removed as a side effect.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        for gzip in [false, true] {
            let path = self.path_for(key, gzip);
            if !path.exists() {
                continue;
            }
            match read_payload(&path, gzip) {
                Ok(payload) => {
                    let now_ms = chrono::Utc::now().timestamp_millis();
                    if payload.expiry <= now_ms {
                        let _ = std::fs::remove_file(&path);
                        return None;
                    }
                    return Some(payload.value);
                }
                Err(_) => {
                    let _ = std::fs::remove_file(&path);
                    return None;
                }
            }
        }
        None
    }

    /// Write a value, compressing it when it exceeds
    /// [`COMPRESS_THRESHOLD_BYTES`]. Writes are atomic: a temp file is
    /// written then renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if serialisation or the filesystem write fails.
    pub fn set(&self, key: &str, value: &Value, expiry_unix_ms: i64) -> Result<(), CacheError> {
        let payload = DiskPayload {
            expiry: expiry_unix_ms,
            value: value.clone(),
        };
        let json = serde_json::to_vec(&payload)?;
        let gzip = json.len() > COMPRESS_THRESHOLD_BYTES;
        let final_path = self.path_for(key, gzip);
        let uncompressed_path = self.path_for(key, false);
        let compressed_path = self.path_for(key, true);

        // Drop whichever variant we are not writing, so stale files never
        // shadow the fresh one.
        if gzip {
            let _ = std::fs::remove_file(&uncompressed_path);
        } else {
            let _ = std::fs::remove_file(&compressed_path);
        }

        let bytes = if gzip {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&json)?;
            encoder.finish()?
        } else {
            json
        };

        let temp_path = final_path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &final_path)?;
        Ok(())
    }

    /// Remove both the compressed and uncompressed variants of `key`.
    pub fn delete(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key, false));
        let _ = std::fs::remove_file(self.path_for(key, true));
    }

    /// Remove every file in the cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be read.
    pub fn clear(&self) -> Result<(), CacheError> {
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let _ = std::fs::remove_file(entry.path());
        }
        Ok(())
    }

    /// Sweep up to `batch_size` files, deleting any that are expired or
    /// unreadable. Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be read.
    pub fn cleanup_batch(&self, batch_size: usize) -> Result<usize, CacheError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.cache_dir)?.take(batch_size) {
            let entry = entry?;
            let path = entry.path();
            let gzip = path.extension().is_some_and(|ext| ext == "gz");
            if path.extension().is_some_and(|ext| ext == "tmp") {
                continue;
            }
            match read_payload(&path, gzip) {
                Ok(payload) if payload.expiry > now_ms => {}
                _ => {
                    let _ = std::fs::remove_file(&path);
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

fn read_payload(path: &Path, gzip: bool) -> Result<DiskPayload, CacheError> {
    let bytes = std::fs::read(path)?;
    let json = if gzip {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        out
    } else {
        bytes
    };
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_small_values() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path()).unwrap();
        let future_ms = chrono::Utc::now().timestamp_millis() + 60_000;
        tier.set("k", &json!({"a": 1}), future_ms).unwrap();
        assert_eq!(tier.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn large_values_are_compressed_and_still_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path()).unwrap();
        let future_ms = chrono::Utc::now().timestamp_millis() + 60_000;
        let big_value = json!({"body": "x".repeat(20 * 1024)});
        tier.set("big", &big_value, future_ms).unwrap();
        assert_eq!(tier.get("big"), Some(big_value));

        let digest = {
            let mut hasher = Md5::new();
            hasher.update(b"big");
            hex::encode(hasher.finalize())
        };
        assert!(dir.path().join(format!("{digest}.json.gz")).exists());
    }

    #[test]
    fn expired_entries_are_reclaimed_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path()).unwrap();
        let past_ms = chrono::Utc::now().timestamp_millis() - 1;
        tier.set("k", &json!(1), past_ms).unwrap();
        assert_eq!(tier.get("k"), None);
    }

    #[test]
    fn cleanup_batch_removes_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::new(dir.path()).unwrap();
        let past_ms = chrono::Utc::now().timestamp_millis() - 1;
        tier.set("k1", &json!(1), past_ms).unwrap();
        let future_ms = chrono::Utc::now().timestamp_millis() + 60_000;
        tier.set("k2", &json!(2), future_ms).unwrap();

        let removed = tier.cleanup_batch(100).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(tier.get("k2"), Some(json!(2)));
    }
}
