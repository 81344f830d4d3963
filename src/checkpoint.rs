//! Resumable run state, one JSON document per parameter triple, written
//! atomically (temp file + rename) so a torn write is never loadable.
use {
    crate::types::{ConfigFault, CountError},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::{
        fs,
        io::Write,
        path::{Path, PathBuf},
    },
};

/// Default directory, relative to the working directory.
pub const CHECKPOINT_DIR: &str = "Checkpoints";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Checkpoint {
    pub v: usize,
    pub l: usize,
    pub c: usize,
    /// chunks for the chunked engines, combinations for the many-vars one
    pub processed_units: u64,
    pub partial_count: u64,
    pub elapsed_ms_before_checkpoint: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CheckpointStore {
    v: usize,
    l: usize,
    c: usize,
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: &Path, v: usize, l: usize, c: usize) -> CheckpointStore {
        CheckpointStore {
            v,
            l,
            c,
            path: dir.join(format!("checkpoint_v{}_l{}_c{}.json", v, l, c)),
        }
    }

    pub fn in_default_dir(v: usize, l: usize, c: usize) -> CheckpointStore {
        CheckpointStore::new(Path::new(CHECKPOINT_DIR), v, l, c)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored state, if any. A missing file and a mismatched
    /// triple both yield `None`; a file that exists but cannot be parsed
    /// is a configuration error (never silently dropped). States with
    /// `processed_units` of zero or at least `total_units` are absent by
    /// definition.
    pub fn load(&self, total_units: u64) -> Result<Option<Checkpoint>, CountError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(_) => return Ok(None),
        };
        let cp: Checkpoint = serde_json::from_str(&text).map_err(|e| {
            CountError::config(
                ConfigFault::Checkpoint,
                format!("corrupt checkpoint {}: {}", self.path.display(), e),
            )
        })?;
        if (cp.v, cp.l, cp.c) != (self.v, self.l, self.c) {
            log::warn!(
                "ignoring checkpoint {} for different parameters (v={}, l={}, c={})",
                self.path.display(),
                cp.v,
                cp.l,
                cp.c
            );
            return Ok(None);
        }
        if cp.processed_units == 0 || total_units <= cp.processed_units {
            return Ok(None);
        }
        Ok(Some(cp))
    }

    /// Atomic save; a failure is logged and the run continues, because a
    /// missed checkpoint only costs repeated work.
    pub fn save(&self, processed_units: u64, partial_count: u64, elapsed_ms: u64) {
        let cp = Checkpoint {
            v: self.v,
            l: self.l,
            c: self.c,
            processed_units,
            partial_count,
            elapsed_ms_before_checkpoint: elapsed_ms,
            last_updated: Utc::now(),
        };
        if let Err(e) = self.write_atomically(&cp) {
            log::error!("checkpoint save failed for {}: {}", self.path.display(), e);
        }
    }

    fn write_atomically(&self, cp: &Checkpoint) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(serde_json::to_string_pretty(cp)?.as_bytes())?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
    }

    /// Deletes the checkpoint after a completed run.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(_) => {}
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::error!("checkpoint removal failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path(), 5, 2, 8);
        assert!(store.load(1000).unwrap().is_none());
        store.save(420, 1234, 9000);
        let cp = store.load(1000).unwrap().unwrap();
        assert_eq!(420, cp.processed_units);
        assert_eq!(1234, cp.partial_count);
        assert_eq!(9000, cp.elapsed_ms_before_checkpoint);
        // no temp file left behind
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn boundary_states_are_absent() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path(), 5, 2, 8);
        store.save(0, 0, 0);
        assert!(store.load(1000).unwrap().is_none());
        store.save(1000, 77, 1);
        assert!(store.load(1000).unwrap().is_none());
        store.save(999, 77, 1);
        assert!(store.load(1000).unwrap().is_some());
    }

    #[test]
    fn mismatched_triple_is_ignored() {
        let dir = TempDir::new().unwrap();
        let writer = CheckpointStore::new(dir.path(), 5, 2, 8);
        writer.save(10, 10, 10);
        // same path, different declared triple
        let other = CheckpointStore {
            v: 6,
            l: 2,
            c: 8,
            path: writer.path().to_path_buf(),
        };
        assert!(other.load(1000).unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path(), 4, 2, 6);
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.path(), b"{ not json").unwrap();
        assert!(store.load(1000).is_err());
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path(), 4, 2, 6);
        store.save(5, 5, 5);
        assert!(store.path().exists());
        store.clear();
        assert!(!store.path().exists());
        store.clear(); // idempotent
    }
}
