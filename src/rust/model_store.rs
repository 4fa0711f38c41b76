use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::classifier::ModelBundle;

const MAGIC: &str = "ticket-triage-model";
const FORMAT_VERSION: u32 = 1;
const DEFAULT_MODEL_PATH: &str = "models/model.bin";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Model at {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("Failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Reads and writes [`ModelBundle`] files.
///
/// A model file is a single header line, `ticket-triage-model/<version> sha256:<hex>`,
/// followed by the JSON-encoded bundle. The checksum covers the payload bytes.
pub struct ModelStore;

impl ModelStore {
    /// Returns the model path configured by `MODEL_PATH`, or `models/model.bin`
    pub fn default_path() -> PathBuf {
        match env::var("MODEL_PATH") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }

    /// Writes `bundle` to `path`, creating parent directories.
    ///
    /// The bytes go to a temporary file in the target directory that is then
    /// renamed over `path`, so readers see either the old file or the new one.
    pub fn save<P: AsRef<Path>>(bundle: &ModelBundle, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        log::info!("Creating model directory at {:?}", parent);
        fs::create_dir_all(&parent)?;

        let payload = serde_json::to_vec(bundle)?;
        let hash = Self::checksum(&payload);
        log::debug!("Serialized bundle: {} bytes, sha256 {}", payload.len(), hash);

        let mut temp = NamedTempFile::new_in(&parent)?;
        writeln!(temp, "{}/{} sha256:{}", MAGIC, FORMAT_VERSION, hash)?;
        temp.write_all(&payload)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| ModelError::IoError(e.error))?;

        log::info!("Model written to {:?}", path);
        Ok(())
    }

    /// Reads a bundle from `path`, verifying the header and checksum.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ModelBundle, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ModelError::NotFound(path.to_path_buf()),
            _ => ModelError::IoError(e),
        })?;
        log::info!("Read {} bytes from {:?}", bytes.len(), path);

        let corrupt = |reason: String| ModelError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let newline = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| corrupt("missing header line".into()))?;
        let header = std::str::from_utf8(&bytes[..newline])
            .map_err(|_| corrupt("header is not valid UTF-8".into()))?;
        let payload = &bytes[newline + 1..];

        let expected_hash = Self::parse_header(header).map_err(corrupt)?;
        let actual_hash = Self::checksum(payload);
        if actual_hash != expected_hash {
            log::error!("Model hash mismatch: expected {}, got {}", expected_hash, actual_hash);
            return Err(corrupt(format!(
                "checksum mismatch: expected {}, got {}",
                expected_hash, actual_hash
            )));
        }

        let bundle: ModelBundle = serde_json::from_slice(payload)
            .map_err(|e| corrupt(format!("cannot decode bundle: {}", e)))?;
        bundle.check_consistency().map_err(corrupt)?;

        log::info!("Loaded model with {} labels", bundle.labels().len());
        Ok(bundle)
    }

    fn parse_header(header: &str) -> Result<String, String> {
        let (tag, hash) = header
            .split_once(' ')
            .ok_or_else(|| format!("unrecognized header '{}'", header))?;
        let version = tag
            .strip_prefix(MAGIC)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| format!("unrecognized header '{}'", header))?;
        if version != FORMAT_VERSION.to_string() {
            return Err(format!("unsupported format version '{}'", version));
        }
        hash.strip_prefix("sha256:")
            .map(str::to_string)
            .ok_or_else(|| format!("missing checksum in header '{}'", header))
    }

    fn checksum(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }
}
