//! Directory-backed store: one `<key>.json` file per key
//!
//! Each file is replaced atomically (write `*.tmp`, then rename), so a
//! crash mid-save leaves the previous value readable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{PersistError, SaveStore};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistError::Backend(format!("invalid key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, text)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

impl SaveStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_items(&mut self, items: &[(&str, String)]) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        for (key, value) in items {
            let path = self.path_for(key)?;
            write_atomic(&path, value)?;
        }
        Ok(())
    }

    fn remove_items(&mut self, keys: &[&str]) -> Result<(), PersistError> {
        for key in keys {
            let path = self.path_for(key)?;
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
