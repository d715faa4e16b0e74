//! On-disk persistence helpers.

use docrag_core::{AppError, AppResult};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with the bytes produced by `write`.
///
/// Content goes to a temp file in the same directory which is then renamed
/// over the target, so readers see either the old file or the new one.
pub fn write_atomic<F>(path: &Path, write: F) -> AppResult<()>
where
    F: FnOnce(&mut dyn Write) -> AppResult<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| AppError::Io(e.error))?;
    tracing::trace!("Wrote {:?}", path);
    Ok(())
}

/// Atomically write a value as pretty-printed JSON.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    write_atomic(path, |w| {
        serde_json::to_writer_pretty(&mut *w, value)?;
        w.write_all(b"\n")?;
        Ok(())
    })
}

/// Calculate the SHA-256 hex digest of a string.
pub fn sha256_hex(text: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("out.txt");

        write_atomic(&path, |w| Ok(w.write_all(b"first")?)).unwrap();
        write_atomic(&path, |w| Ok(w.write_all(b"second")?)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_failed_write_keeps_old_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.txt");
        fs::write(&path, "old").unwrap();

        let result = write_atomic(&path, |_| Err(AppError::Other("boom".to_string())));
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("Hello, world!");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, sha256_hex("Hello, world!"));
        assert_ne!(hash, sha256_hex("Different text"));
    }
}
