// Durable queue snapshots in two slots: "current", rewritten after every unit
// of work, and "master", the checkpoint written at the end of discovery.

use crate::error::{Result, TrawlError};
use crate::queue::WorkQueue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Current,
    Master,
}

impl Slot {
    pub fn file_name(&self) -> &'static str {
        match self {
            Slot::Current => "queue.json",
            Slot::Master => "queue_master.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Current => "current",
            Slot::Master => "master",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    revision: u64,
    saved_at: DateTime<Utc>,
    urls: Vec<String>,
}

/// Summary of what a slot holds, for choosing which one to recover from.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotStatus {
    pub slot: Slot,
    pub revision: u64,
    pub saved_at: DateTime<Utc>,
    pub len: usize,
}

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(slot.file_name())
    }

    pub fn exists(&self, slot: Slot) -> bool {
        self.path(slot).exists()
    }

    /// Overwrite `slot` with the whole queue. The snapshot is written to a
    /// temporary file next to the slot and renamed into place, so a crash
    /// leaves either the old or the new snapshot, never a torn one.
    pub fn save(&self, slot: Slot, queue: &WorkQueue) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let snapshot = Snapshot {
            revision: queue.revision(),
            saved_at: Utc::now(),
            urls: queue.to_vec(),
        };

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(self.path(slot)).map_err(|e| e.error)?;

        debug!(
            "Saved {} URLs to {} slot (revision {})",
            snapshot.urls.len(),
            slot,
            snapshot.revision
        );
        Ok(())
    }

    pub fn load(&self, slot: Slot) -> Result<WorkQueue> {
        let snapshot = self.read(slot)?;
        debug!(
            "Loaded {} URLs from {} slot (revision {})",
            snapshot.urls.len(),
            slot,
            snapshot.revision
        );
        Ok(WorkQueue::from_snapshot(snapshot.urls, snapshot.revision))
    }

    /// Mirror the queue into the master slot, then refresh current from it.
    pub fn checkpoint(&self, queue: &WorkQueue) -> Result<()> {
        self.save(Slot::Master, queue)?;
        self.save(Slot::Current, queue)
    }

    /// Load the master slot and make it the current one.
    pub fn restore_master(&self) -> Result<WorkQueue> {
        let queue = self.load(Slot::Master)?;
        self.save(Slot::Current, &queue)?;
        Ok(queue)
    }

    /// An empty queue whose revision continues from the newest slot, so the
    /// next save outranks anything already on disk. Unreadable slots are
    /// skipped.
    pub fn fresh_queue(&self) -> WorkQueue {
        let mut revision = 0;
        for slot in [Slot::Current, Slot::Master] {
            match self.status(slot) {
                Ok(Some(status)) => revision = revision.max(status.revision),
                Ok(None) => {}
                Err(e) => warn!("Ignoring unreadable {} slot: {}", slot, e),
            }
        }
        WorkQueue::from_snapshot(Vec::new(), revision)
    }

    /// `None` when the slot has never been written.
    pub fn status(&self, slot: Slot) -> Result<Option<SlotStatus>> {
        if !self.exists(slot) {
            return Ok(None);
        }
        let snapshot = self.read(slot)?;
        Ok(Some(SlotStatus {
            slot,
            revision: snapshot.revision,
            saved_at: snapshot.saved_at,
            len: snapshot.urls.len(),
        }))
    }

    fn read(&self, slot: Slot) -> Result<Snapshot> {
        let path = self.path(slot);
        if !path.exists() {
            return Err(TrawlError::SlotMissing(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
