//! Durable store — append-only journal log plus a state snapshot.
//!
//! Two files under one directory:
//!
//! - `journal.jsonl`  — every ledger entry, one JSON object per line,
//!   append-only. The audit trail; never rewritten.
//! - `snapshot.json`  — current accounts, holds, and rooms, replaced
//!   whole via tmp-file rename.
//!
//! [`Store::persist`] writes the journal suffix first and the state file
//! second. A directory holding a journal but no state file is an
//! interrupted first persist; [`Store::load`] treats it as empty and the
//! journal-regression check in [`Store::sync_journal`] refuses to append
//! past it.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rackup_ledger::LedgerSnapshot;
use rackup_types::{EngineError, LedgerEntry, Result, Room};
use serde::{Deserialize, Serialize};
use tracing::info;

const JOURNAL_FILE: &str = "journal.jsonl";
const SNAPSHOT_FILE: &str = "snapshot.json";
const SNAPSHOT_TMP: &str = "snapshot.json.tmp";

/// Everything an engine needs to restart: ledger state, the full
/// journal, and every room (live and terminal).
#[derive(Debug, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub ledger: LedgerSnapshot,
    pub journal: Vec<LedgerEntry>,
    pub rooms: Vec<Room>,
}

/// The state file on disk. The journal lives in its own log, so the
/// snapshot carries only current state.
#[derive(Serialize, Deserialize)]
struct StateFile {
    ledger: LedgerSnapshot,
    rooms: Vec<Room>,
}

/// File-backed persistence for one engine instance.
pub struct Store {
    dir: PathBuf,
    /// Entries already on disk; `sync_journal` appends past this mark.
    journal_len: usize,
}

impl Store {
    /// Open (or create) the store directory.
    ///
    /// # Errors
    /// `Io` if the directory or journal cannot be read.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let journal_len = match File::open(dir.join(JOURNAL_FILE)) {
            Ok(file) => BufReader::new(file).lines().count(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => 0,
            Err(err) => return Err(err.into()),
        };
        Ok(Self { dir, journal_len })
    }

    /// Write everything: the new journal suffix, then the state file.
    ///
    /// # Errors
    /// `Io`, `Serialization`, or `Internal` on journal regression.
    pub fn persist(&mut self, snapshot: &EngineSnapshot) -> Result<()> {
        let appended = self.sync_journal(&snapshot.journal)?;
        self.write_state(&snapshot.ledger, &snapshot.rooms)?;
        if appended > 0 {
            info!(appended, total = self.journal_len, "journal synced");
        }
        Ok(())
    }

    /// Append every journal entry not yet on disk. `entries` must extend
    /// the persisted log — the journal is append-only, so the in-memory
    /// journal of an engine restored from this store always does.
    ///
    /// # Errors
    /// `Internal` if `entries` is shorter than the persisted log (the
    /// engine was not restored from this store), otherwise `Io` or
    /// `Serialization`.
    pub fn sync_journal(&mut self, entries: &[LedgerEntry]) -> Result<usize> {
        if entries.len() < self.journal_len {
            return Err(EngineError::Internal(format!(
                "journal regression: store holds {} entries, engine holds {}",
                self.journal_len,
                entries.len()
            )));
        }
        let new = &entries[self.journal_len..];
        if new.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.journal_path())?;
        let mut writer = BufWriter::new(file);
        for entry in new {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        self.journal_len = entries.len();
        Ok(new.len())
    }

    /// Load the persisted world, or `None` for a fresh directory.
    ///
    /// # Errors
    /// `Io` or `Serialization` for unreadable files.
    pub fn load(&self) -> Result<Option<EngineSnapshot>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path)?;
        let state: StateFile = serde_json::from_reader(BufReader::new(file))?;
        let journal = self.load_journal()?;
        Ok(Some(EngineSnapshot {
            ledger: state.ledger,
            journal,
            rooms: state.rooms,
        }))
    }

    /// Read the full journal log, oldest first.
    ///
    /// # Errors
    /// `Io` or `Serialization` for unreadable lines.
    pub fn load_journal(&self) -> Result<Vec<LedgerEntry>> {
        let file = match File::open(self.journal_path()) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    /// Entries currently persisted in the journal log.
    #[must_use]
    pub fn journal_len(&self) -> usize {
        self.journal_len
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_state(&self, ledger: &LedgerSnapshot, rooms: &[Room]) -> Result<()> {
        let state = StateFile {
            ledger: ledger.clone(),
            rooms: rooms.to_vec(),
        };
        let tmp = self.dir.join(SNAPSHOT_TMP);
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &state)?;
        writer.flush()?;
        fs::rename(&tmp, self.snapshot_path())?;
        Ok(())
    }

    fn journal_path(&self) -> PathBuf {
        self.dir.join(JOURNAL_FILE)
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }
}
