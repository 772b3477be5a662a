use std::io;
use std::path::PathBuf;

use desk_core::CacheStore;
use desk_engine::{AtomicFileWriter, PersistError};
use desk_logging::{desk_info, desk_warn};

const CACHE_FILENAME: &str = "solution_cache.json";

/// Solution cache stored as one JSON file under the state directory.
pub struct FileCacheStore {
    writer: AtomicFileWriter,
}

impl FileCacheStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(CACHE_FILENAME)
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self) -> Option<String> {
        match self.writer.read(CACHE_FILENAME) {
            Ok(Some(blob)) => {
                desk_info!("Loaded solution cache from {}", self.path().display());
                Some(blob)
            }
            Ok(None) => None,
            Err(err) => {
                desk_warn!(
                    "Failed to read solution cache {}: {}",
                    self.path().display(),
                    err
                );
                None
            }
        }
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        match self.writer.write(CACHE_FILENAME, blob) {
            Ok(_) => Ok(()),
            Err(PersistError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::other(err.to_string())),
        }
    }
}
