//! Atomic JSON persistence: every write lands via a temp file + rename so a
//! crash mid-write can never leave a torn document on disk.

use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ConfigError, Result};

pub fn read_json_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to parse JSON, falling back to default");
                Ok(T::default())
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(err) => Err(ConfigError::IoError(err)),
    }
}

/// Like [`read_json_or_default`], but also re-persists the recovered
/// default to `path` whenever the document was missing or unreadable, so a
/// corrupt or absent file heals itself on first load instead of failing the
/// same way on every subsequent process start.
pub fn read_json_or_heal<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to parse JSON, restoring default");
                let default = T::default();
                write_json_atomic(path, &default)?;
                Ok(default)
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let default = T::default();
            write_json_atomic(path, &default)?;
            Ok(default)
        }
        Err(err) => Err(ConfigError::IoError(err)),
    }
}

pub fn write_json_atomic<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let serialized = serde_json::to_vec_pretty(value).map_err(ConfigError::JsonSerError)?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("dexter")
    ));

    fs::write(&tmp_path, &serialized)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use tempfile::tempdir;

    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn test_read_missing_file_returns_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let loaded: Sample = read_json_or_default(&path).unwrap();
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("sample.json");

        write_json_atomic(&path, &Sample { value: 42 }).unwrap();
        let loaded: Sample = read_json_or_default(&path).unwrap();

        assert_eq!(loaded, Sample { value: 42 });
    }

    #[test]
    fn test_write_leaves_no_tmp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.json");

        write_json_atomic(&path, &Sample { value: 1 }).unwrap();

        let tmp_path = dir.path().join(".sample.json.tmp");
        assert!(!tmp_path.exists());
        assert!(path.exists());
    }

    #[test]
    fn test_read_or_default_falls_back_on_corrupt_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, b"not valid json").unwrap();

        let loaded: Sample = read_json_or_default(&path).unwrap();
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn test_heal_restores_default_and_persists_on_corrupt_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, b"not valid json").unwrap();

        let loaded: Sample = read_json_or_heal(&path).unwrap();
        assert_eq!(loaded, Sample::default());

        let reloaded: Sample = read_json_or_default(&path).unwrap();
        assert_eq!(reloaded, Sample::default());
    }

    #[test]
    fn test_heal_persists_default_when_file_is_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let loaded: Sample = read_json_or_heal(&path).unwrap();
        assert_eq!(loaded, Sample::default());
        assert!(path.exists());
    }
}
