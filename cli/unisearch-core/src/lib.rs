pub mod filter;
pub mod pagination;
pub mod profile;
pub mod query;

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use fslock::LockFile;
use serde::Serialize;

pub use filter::{FilterState, SortKey};
pub use pagination::PaginationDescriptor;
pub use query::QueryCodec;

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("file stored in an invalid location: {0}")]
    InvalidLocation(PathBuf),
    #[error("failed to open temporary file")]
    OpenTmpFile(#[source] std::io::Error),
    #[error("failed to rename temporary file")]
    RenameTmpFile(#[source] tempfile::PersistError),
    #[error("failed to write temporary file")]
    WriteTmpFile(#[source] serde_json::Error),
}

/// Serialize a value as JSON and write it to disk atomically.
///
/// The value is written to a temporary file next to `path`,
/// which is then renamed over `path`.
/// The [LockFile] argument ensures the write only happens while the lock is held.
/// Passing a lock that doesn't belong to `path` bypasses the lock.
pub fn serialize_atomically<T>(
    value: &T,
    path: &impl AsRef<Path>,
    _lock: LockFile,
) -> Result<(), SerializeError>
where
    T: ?Sized + Serialize,
{
    // `path` without a parent is `/`, `.` or empty
    let parent = path
        .as_ref()
        .parent()
        .ok_or(SerializeError::InvalidLocation(path.as_ref().to_path_buf()))?;
    let temp_file = tempfile::NamedTempFile::new_in(parent).map_err(SerializeError::OpenTmpFile)?;

    let writer = BufWriter::new(&temp_file);
    serde_json::to_writer_pretty(writer, value).map_err(SerializeError::WriteTmpFile)?;
    temp_file
        .persist(path.as_ref())
        .map_err(SerializeError::RenameTmpFile)?;
    Ok(())
}

/// Returns a `tracing`-compatible form of a [Path]
pub fn traceable_path(p: impl AsRef<Path>) -> impl tracing::Value {
    let path = p.as_ref();
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_atomically_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");
        std::fs::write(&path, "stale").unwrap();

        let lock = LockFile::open(dir.path().join("value.lock").as_os_str()).unwrap();
        serialize_atomically(&serde_json::json!({"a": 1}), &path, lock).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"a": 1}));
    }

    #[test]
    fn serialize_atomically_rejects_root() {
        let dir = tempfile::tempdir().unwrap();
        let lock = LockFile::open(dir.path().join("value.lock").as_os_str()).unwrap();
        let result = serialize_atomically(&1, &Path::new("/"), lock);
        assert!(matches!(result, Err(SerializeError::InvalidLocation(_))));
    }
}
