//! Whole-file replacement through a temporary sibling file

use crate::traits::StorageResult;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes to a uniquely named temporary file and renames it over the target
/// on commit. Readers see either the old contents or the new ones.
pub struct AtomicWriter {
    temp_path: PathBuf,
    final_path: PathBuf,
    /// `None` once committed
    file: Option<File>,
}

impl AtomicWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let final_path = path.as_ref().to_path_buf();

        if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Unique per writer so concurrent saves never share a temp file
        let temp_path = Self::temp_path(&final_path);
        let file = File::create(&temp_path)?;

        Ok(Self {
            temp_path,
            final_path,
            file: Some(file),
        })
    }

    /// Replace the contents of `path` with `data`
    pub fn replace<P: AsRef<Path>>(path: P, data: &[u8]) -> StorageResult<()> {
        let mut writer = Self::new(path)?;
        writer.write(data)?;
        writer.commit()
    }

    pub fn write(&mut self, data: &[u8]) -> StorageResult<()> {
        match self.file.as_mut() {
            Some(file) => Ok(file.write_all(data)?),
            None => Err(std::io::Error::other("writer already committed").into()),
        }
    }

    pub fn commit(mut self) -> StorageResult<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush()?;
        file.sync_all()?;
        // Closed before the rename
        drop(file);

        // On failure Drop removes the temp file
        fs::rename(&self.temp_path, &self.final_path)?;
        self.temp_path = PathBuf::new();
        Ok(())
    }

    fn temp_path(final_path: &Path) -> PathBuf {
        let mut temp = final_path.as_os_str().to_owned();
        temp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        PathBuf::from(temp)
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        if !self.temp_path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_replace_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested/metrics.json");

        AtomicWriter::replace(&file_path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_replace_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("metrics.json");
        fs::write(&file_path, b"old").unwrap();

        AtomicWriter::replace(&file_path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new");
    }

    #[test]
    fn test_drop_without_commit_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("metrics.json");

        {
            let mut writer = AtomicWriter::new(&file_path).unwrap();
            writer.write(b"uncommitted").unwrap();
        }

        assert!(!file_path.exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_writers_use_distinct_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("metrics.json");

        let mut first = AtomicWriter::new(&file_path).unwrap();
        let mut second = AtomicWriter::new(&file_path).unwrap();
        first.write(b"first").unwrap();
        second.write(b"second").unwrap();
        first.commit().unwrap();
        second.commit().unwrap();

        // Last commit wins
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_commit_closes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("metrics.json");
        let open_fds = || fs::read_dir("/proc/self/fd").unwrap().count();

        // Warm up so lazily opened descriptors do not skew the count
        AtomicWriter::replace(&file_path, b"{}").unwrap();
        let before = open_fds();
        for i in 0..50 {
            AtomicWriter::replace(&file_path, format!("{{\"n\": {}}}", i).as_bytes()).unwrap();
        }
        let after = open_fds();

        // Other test threads may open files concurrently
        assert!(after < before + 10, "open fds grew from {} to {}", before, after);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{\"n\": 49}");
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be replaced by a file
        let target = temp_dir.path().join("occupied");
        fs::create_dir_all(target.join("child")).unwrap();

        assert!(AtomicWriter::replace(&target, b"data").is_err());

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
    }
}
