//! Shared store utilities.
//!
//! Shared functions for the file-backed record stores: sharded directory
//! allocation and atomic JSON persistence used across the request, pharmacy,
//! and cart stores.

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use psx_uuid::RecordUuid;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RequestError, RequestResult};

/// Creates a unique sharded directory within a base records directory.
///
/// Allocates fresh identifiers and attempts to create the corresponding
/// sharded directory, guarding against identifier collisions or
/// pre-existing directories by retrying a bounded number of times.
///
/// # Returns
///
/// The allocated [`RecordUuid`] and the path to the created directory.
///
/// # Errors
///
/// Returns [`RequestError::RecordDirCreation`] if:
/// - directory creation fails after 5 attempts,
/// - parent directory creation fails.
pub(crate) fn create_uuid_and_shard_dir(base_dir: &Path) -> RequestResult<(RecordUuid, PathBuf)> {
    // Guard against pathological UUID collisions (or pre-existing directories
    // from external interference) by limiting retries.
    for _attempt in 0..5 {
        let id = RecordUuid::new();
        let candidate = id.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(RequestError::RecordDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((id, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(RequestError::RecordDirCreation(e)),
        }
    }

    Err(RequestError::RecordDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique record directory after 5 attempts",
    )))
}

/// Serialises `value` into `record_dir/filename` atomically.
///
/// The JSON is written to a temporary sibling first and renamed into place,
/// so a reader never observes a half-written record.
///
/// # Errors
///
/// Returns [`RequestError::Serialization`] or [`RequestError::FileWrite`].
pub(crate) fn write_json_atomic<T: Serialize>(
    record_dir: &Path,
    filename: &str,
    value: &T,
) -> RequestResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(RequestError::Serialization)?;

    let tmp_path = record_dir.join(format!(".{filename}.tmp"));
    let final_path = record_dir.join(filename);

    fs::write(&tmp_path, json).map_err(RequestError::FileWrite)?;
    fs::rename(&tmp_path, &final_path).map_err(RequestError::FileWrite)
}

/// Reads and deserialises a JSON record file.
///
/// # Errors
///
/// Returns [`RequestError::FileRead`] or [`RequestError::Deserialization`].
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> RequestResult<T> {
    let contents = fs::read_to_string(path).map_err(RequestError::FileRead)?;
    serde_json::from_str(&contents).map_err(RequestError::Deserialization)
}

/// Walks a sharded records directory, yielding each leaf record directory.
///
/// The layout is `<base>/<s1>/<s2>/<uuid>/`; anything that is not a
/// directory at the expected depth is ignored.
pub(crate) fn walk_record_dirs(base_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    let s1_iter = match fs::read_dir(base_dir) {
        Ok(it) => it,
        Err(_) => return dirs,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };
        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                if id_path.is_dir() {
                    dirs.push(id_path);
                }
            }
        }
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[test]
    fn test_create_shard_dir_layout() {
        let base = TempDir::new().unwrap();
        let (id, dir) = create_uuid_and_shard_dir(base.path()).unwrap();

        assert!(dir.is_dir());
        assert_eq!(dir, id.sharded_dir(base.path()));
    }

    #[test]
    fn test_write_then_read_json() {
        let base = TempDir::new().unwrap();
        let probe = Probe { value: 42 };

        write_json_atomic(base.path(), "probe.json", &probe).unwrap();
        let back: Probe = read_json(&base.path().join("probe.json")).unwrap();

        assert_eq!(back, probe);
        // No temp file left behind
        assert!(!base.path().join(".probe.json.tmp").exists());
    }

    #[test]
    fn test_read_missing_file_fails() {
        let base = TempDir::new().unwrap();
        let result: RequestResult<Probe> = read_json(&base.path().join("absent.json"));
        assert!(matches!(result, Err(RequestError::FileRead(_))));
    }

    #[test]
    fn test_walk_finds_created_record_dirs() {
        let base = TempDir::new().unwrap();
        let (_, d1) = create_uuid_and_shard_dir(base.path()).unwrap();
        let (_, d2) = create_uuid_and_shard_dir(base.path()).unwrap();

        let mut found = walk_record_dirs(base.path());
        found.sort();
        let mut expected = vec![d1, d2];
        expected.sort();

        assert_eq!(found, expected);
    }

    #[test]
    fn test_walk_missing_base_is_empty() {
        let base = TempDir::new().unwrap();
        let found = walk_record_dirs(&base.path().join("nope"));
        assert!(found.is_empty());
    }
}
