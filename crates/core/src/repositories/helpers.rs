//! Filesystem helpers shared by the file-backed stores.

use crate::{IdentityError, IdentityResult};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Two-level shard directory for `key` under `root`: `<root>/<key[0..2]>/<key[2..4]>`.
///
/// Keys are ASCII (digits or lowercase hex) and at least four characters long.
pub(crate) fn shard_dir(root: &Path, key: &str) -> PathBuf {
    root.join(&key[0..2]).join(&key[2..4])
}

fn ensure_parent(path: &Path) -> IdentityResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IdentityError::StorageUnavailable)?;
    }
    Ok(())
}

/// A sibling of `path` that no other writer will pick.
fn temp_path(path: &Path) -> PathBuf {
    path.with_extension(format!("{:016x}.tmp", rand::random::<u64>()))
}

/// Writes `value` to `path` only if no file exists there yet.
///
/// The document is written and synced under a temporary name, then hard-linked into place.
/// Linking fails with `AlreadyExists` when the path is taken, so readers never see a partial
/// record and the existing file is not touched. Returns `Ok(false)` in that case.
pub(crate) fn create_json<T: Serialize>(path: &Path, value: &T) -> IdentityResult<bool> {
    let bytes = serde_json::to_vec_pretty(value).map_err(IdentityError::Serialization)?;
    ensure_parent(path)?;

    let tmp = temp_path(path);
    let written = fs::File::create(&tmp)
        .and_then(|mut file| file.write_all(&bytes).and_then(|()| file.sync_all()));
    let linked = written.and_then(|()| fs::hard_link(&tmp, path));

    match fs::remove_file(&tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(cleanup) => {
            tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary record");
        }
    }

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(IdentityError::StorageUnavailable(e)),
    }
}

/// Creates or replaces the document at `path` via a temporary file and a rename.
pub(crate) fn replace_json<T: Serialize>(path: &Path, value: &T) -> IdentityResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(IdentityError::Serialization)?;
    ensure_parent(path)?;

    let tmp = temp_path(path);
    let result = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(IdentityError::StorageUnavailable(e));
    }
    Ok(())
}

/// Reads the document at `path`. A missing file is `Ok(None)`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> IdentityResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(IdentityError::StorageUnavailable(e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(IdentityError::Deserialization)
}

/// Every entry three levels below `root` (`<s1>/<s2>/<leaf>`).
///
/// Unreadable directories are skipped. A missing `root` yields nothing.
pub(crate) fn sharded_leaves(root: &Path) -> Vec<PathBuf> {
    let mut leaves = Vec::new();

    let s1_iter = match fs::read_dir(root) {
        Ok(it) => it,
        Err(_) => return leaves,
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

            let leaf_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            leaves.extend(leaf_iter.flatten().map(|leaf| leaf.path()));
        }
    }

    leaves
}

/// `.json` files directly inside `dir`. A missing directory yields nothing.
pub(crate) fn json_files(dir: &Path) -> IdentityResult<Vec<PathBuf>> {
    let iter = match fs::read_dir(dir) {
        Ok(it) => it,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(IdentityError::StorageUnavailable(e)),
    };

    Ok(iter
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(crate::constants::JSON_EXTENSION)
        })
        .collect())
}
