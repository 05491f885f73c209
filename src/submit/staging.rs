//! Transient on-disk copies of uploaded payloads.
//!
//! Each upload gets its own generated file name, so concurrent uploads with the
//! same client-side name never share a path. The file is removed when the
//! `StagedUpload` is dropped, on success and failure alike.

use std::io::Write;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::config::STAGING_FILE_PREFIX;

/// An uploaded payload persisted to a unique temporary file.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    file_name: String,
    size: u64,
    sha256: String,
}

impl StagedUpload {
    /// Writes `payload` to a fresh file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be created or written.
    pub fn create(dir: &Path, file_name: &str, payload: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(STAGING_FILE_PREFIX)
            .suffix(".upload")
            .tempfile_in(dir)?;
        file.write_all(payload)?;
        file.flush()?;

        Ok(Self {
            file,
            file_name: file_name.to_string(),
            size: payload.len() as u64,
            sha256: calculate_sha256(payload),
        })
    }

    /// Runs [`StagedUpload::create`] on the blocking pool so large payloads do
    /// not stall a runtime worker.
    pub async fn stage(dir: PathBuf, file_name: String, payload: Bytes) -> std::io::Result<Self> {
        tokio::task::spawn_blocking(move || Self::create(&dir, &file_name, &payload))
            .await
            .map_err(std::io::Error::other)?
    }

    /// Reads the staged bytes back for forwarding.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Client-supplied name; never used as a path component.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Removes the file now and reports failures, instead of the silent removal on drop.
    pub fn cleanup(self) -> std::io::Result<()> {
        let path: PathBuf = self.file.path().to_path_buf();
        self.file.close().map_err(|e| {
            log::warn!("Failed to remove staged upload {}: {}", path.display(), e);
            e
        })
    }
}

/// Hex-encoded SHA-256 of `data`.
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            calculate_sha256(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_staged_upload_round_trip_and_cleanup_on_drop() {
        let dir = TempDir::new().unwrap();
        let staged = StagedUpload::create(dir.path(), "report.pdf", b"%PDF-1.7 body").unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
        assert_eq!(staged.size(), 13);
        assert_eq!(staged.read().await.unwrap(), b"%PDF-1.7 body");

        drop(staged);
        assert!(!path.exists(), "staged file must be removed on drop");
    }

    #[test]
    fn test_same_client_name_gets_distinct_paths() {
        let dir = TempDir::new().unwrap();
        let a = StagedUpload::create(dir.path(), "same.pdf", b"first").unwrap();
        let b = StagedUpload::create(dir.path(), "same.pdf", b"second").unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read(a.path()).unwrap(), b"first");
        assert_eq!(std::fs::read(b.path()).unwrap(), b"second");
    }

    #[test]
    fn test_client_name_is_not_a_path() {
        let dir = TempDir::new().unwrap();
        let staged = StagedUpload::create(dir.path(), "../../etc/passwd", b"x").unwrap();
        assert!(staged.path().starts_with(dir.path()));
        assert_eq!(staged.file_name(), "../../etc/passwd");
    }

    #[test]
    fn test_explicit_cleanup_removes_file() {
        let dir = TempDir::new().unwrap();
        let staged = StagedUpload::create(dir.path(), "a.bin", b"x").unwrap();
        let path = staged.path().to_path_buf();
        staged.cleanup().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_stage_writes_large_payload_from_async_context() {
        let dir = TempDir::new().unwrap();
        let payload = Bytes::from(vec![0x5a; 4 * 1024 * 1024]);

        let staged = StagedUpload::stage(
            dir.path().to_path_buf(),
            "big.bin".to_string(),
            payload.clone(),
        )
        .await
        .unwrap();

        assert_eq!(staged.size(), payload.len() as u64);
        assert_eq!(staged.sha256(), calculate_sha256(&payload));
        assert_eq!(staged.read().await.unwrap(), payload.to_vec());
    }

    #[tokio::test]
    async fn test_stage_reports_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = StagedUpload::stage(missing, "a.bin".to_string(), Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(StagedUpload::create(&missing, "a.bin", b"x").is_err());
    }
}
