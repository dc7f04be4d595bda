//! Save/load functionality for progression and viewport state.
//!
//! Progression uses bincode for compact binary saves with a format version.
//! The viewport is small and human-tweakable, so it is stored as JSON.
//! [`FileStore`] is the directory-backed [`DurableStore`]; it swallows write
//! errors after logging them.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skilltree_logic::progression::PersistedSkillRecord;
use skilltree_logic::viewport::ViewportState;
use skilltree_logic::SkillId;

use crate::collaborators::DurableStore;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

const PROGRESSION_FILE: &str = "progression.sav";
const VIEWPORT_FILE: &str = "viewport.json";

/// Serializable snapshot of persisted progression.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressionSave {
    pub version: u32,
    pub records: HashMap<SkillId, PersistedSkillRecord>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Write persisted records to a writer.
pub fn save_progression<W: Write>(
    writer: W,
    records: &HashMap<SkillId, PersistedSkillRecord>,
) -> Result<(), SaveError> {
    let save = ProgressionSave {
        version: SAVE_VERSION,
        records: records.clone(),
    };
    bincode::serialize_into(writer, &save)?;
    Ok(())
}

/// Read persisted records from a reader.
pub fn load_progression<R: Read>(
    reader: R,
) -> Result<HashMap<SkillId, PersistedSkillRecord>, SaveError> {
    let save: ProgressionSave = bincode::deserialize_from(reader)?;
    if save.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save.version,
        });
    }
    Ok(save.records)
}

pub fn save_viewport<W: Write>(writer: W, state: &ViewportState) -> Result<(), SaveError> {
    serde_json::to_writer_pretty(writer, state)?;
    Ok(())
}

pub fn load_viewport<R: Read>(reader: R) -> Result<ViewportState, SaveError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Directory-backed durable store.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`, created on first write if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Saved progression, or `Ok(None)` if nothing has been saved yet.
    pub fn read_progression(
        &self,
    ) -> Result<Option<HashMap<SkillId, PersistedSkillRecord>>, SaveError> {
        match File::open(self.path(PROGRESSION_FILE)) {
            Ok(file) => load_progression(BufReader::new(file)).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Saved viewport, or `Ok(None)` if nothing has been saved yet.
    pub fn read_viewport(&self) -> Result<Option<ViewportState>, SaveError> {
        match File::open(self.path(VIEWPORT_FILE)) {
            Ok(file) => load_viewport(BufReader::new(file)).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_with<F>(&self, file: &str, write: F) -> Result<(), SaveError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), SaveError>,
    {
        fs::create_dir_all(&self.dir)?;
        let mut out = BufWriter::new(File::create(self.path(file))?);
        write(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

impl DurableStore for FileStore {
    fn write_viewport(&mut self, state: &ViewportState) {
        if let Err(e) = self.write_with(VIEWPORT_FILE, |out| save_viewport(out, state)) {
            log::warn!("Viewport write to {} failed: {}", self.dir.display(), e);
        }
    }

    fn write_progression(&mut self, records: &HashMap<SkillId, PersistedSkillRecord>) {
        if let Err(e) = self.write_with(PROGRESSION_FILE, |out| save_progression(out, records)) {
            log::warn!("Progression write to {} failed: {}", self.dir.display(), e);
        }
    }
}

/// Debounce for viewport writes.
///
/// Each change restarts the quiescence window; the write fires once the
/// window elapses with no further change. An immediate flush cancels it.
#[derive(Debug, Clone)]
pub struct WriteScheduler {
    debounce_secs: f64,
    last_change: Option<f64>,
}

impl WriteScheduler {
    pub fn new(debounce_secs: f64) -> Self {
        Self {
            debounce_secs,
            last_change: None,
        }
    }

    pub fn mark_dirty(&mut self, now: f64) {
        self.last_change = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// True if a pending write's window has elapsed at `now`.
    pub fn due(&self, now: f64) -> bool {
        self.last_change
            .is_some_and(|t| now - t >= self.debounce_secs)
    }

    /// Drop the pending write. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.last_change.take().is_some()
    }
}
