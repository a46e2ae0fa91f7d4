//! Disk column storage: one zstd compressed snapshot file per column.

use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use cubic_utils::ColumnPos;

/// zstd level used for column files.
const COMPRESSION_LEVEL: i32 = 3;

/// Stores columns as `c.<x>.<z>.col` files under a directory.
#[derive(Debug)]
pub struct DiskStorage {
    dir: PathBuf,
}

impl DiskStorage {
    /// Opens the directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The directory holding the column files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn column_path(&self, pos: ColumnPos) -> PathBuf {
        self.dir.join(format!("c.{}.{}.col", pos.x, pos.z))
    }

    /// Reads and decompresses a column file, `None` when there is none.
    pub fn read_column(&self, pos: ColumnPos) -> io::Result<Option<Vec<u8>>> {
        let compressed = match fs::read(self.column_path(pos)) {
            Ok(compressed) => compressed,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        zstd::decode_all(&compressed[..]).map(Some)
    }

    /// Compresses and writes a column file.
    ///
    /// The data goes to a temporary file first which then replaces the old one.
    pub fn write_column(&self, pos: ColumnPos, bytes: &[u8]) -> io::Result<()> {
        let compressed = zstd::encode_all(bytes, COMPRESSION_LEVEL)?;

        let path = self.column_path(pos);
        let tmp = path.with_extension("col.tmp");
        let mut writer = BufWriter::new(File::create(&tmp)?);
        writer.write_all(&compressed)?;
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &path)
    }

    /// Checks if a column file exists.
    #[must_use]
    pub fn column_exists(&self, pos: ColumnPos) -> bool {
        self.column_path(pos).is_file()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_naming() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::open(dir.path().join("world")).unwrap();
        storage.write_column(ColumnPos::new(-2, 7), b"snapshot").unwrap();

        assert!(dir.path().join("world").join("c.-2.7.col").is_file());
        assert!(!dir.path().join("world").join("c.-2.7.col.tmp").exists());
        assert_eq!(
            storage.read_column(ColumnPos::new(-2, 7)).unwrap().as_deref(),
            Some(&b"snapshot"[..])
        );
        assert_eq!(storage.read_column(ColumnPos::new(0, 0)).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).unwrap();
        fs::write(dir.path().join("c.0.0.col"), b"not zstd").unwrap();
        assert!(storage.read_column(ColumnPos::new(0, 0)).is_err());
    }
}
