// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL event write-ahead log.
//!
//! Events are durably stored before being applied to the in-memory mirror,
//! enabling crash recovery via snapshot + replay. Unlike a single-writer
//! daemon, this WAL is shared by multiple cooperating processes (the tick
//! loop, refresh workers, the zombie sweeper), so every `append` is
//! immediately flushed and fsynced rather than batched on a timer — callers
//! only ever append while holding the exclusive store lock.
//!
//! Each entry is a single line of JSON: `{"seq":N,"event":{...}}\n`

use crate::Event;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct WalRecordRef<'a> {
    seq: u64,
    event: &'a Event,
}

#[derive(Deserialize)]
struct WalRecord {
    seq: u64,
    event: Event,
}

/// A single WAL entry with its assigned sequence number.
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// Append-only JSONL WAL shared across processes.
pub struct Wal {
    file: File,
    path: PathBuf,
    write_seq: u64,
}

impl Wal {
    /// Open or create a WAL at the given path, scanning it to recover the
    /// current write sequence. `processed_seq` (the snapshot's watermark)
    /// is used only to decide whether a corrupt tail can be safely dropped.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let write_seq = Self::scan_max_seq(&file, path)?;

        Ok(Self {
            file,
            path: path.to_owned(),
            write_seq,
        })
    }

    /// Scan the WAL for the highest sequence number, rotating a corrupt tail
    /// out to `.bak` and keeping every entry parsed before the corruption.
    fn scan_max_seq(file: &File, path: &Path) -> Result<u64, WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut max_seq = 0u64;
        let mut line = String::new();
        let mut valid_lines = Vec::new();
        let mut corrupt = false;

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    corrupt = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<WalRecord>(trimmed) {
                Ok(record) => {
                    max_seq = max_seq.max(record.seq);
                    valid_lines.push(trimmed.to_string());
                }
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        if corrupt {
            let bak_path = crate::snapshot::rotate_bak_path(path);
            warn!(
                path = %path.display(),
                bak = %bak_path.display(),
                valid_entries = valid_lines.len(),
                "corrupt WAL tail detected, rotating to .bak"
            );
            drop(reader);
            std::fs::rename(path, &bak_path)?;
            let mut new_file = File::create(path)?;
            for l in &valid_lines {
                new_file.write_all(l.as_bytes())?;
                new_file.write_all(b"\n")?;
            }
            new_file.sync_all()?;
        }

        Ok(max_seq)
    }

    /// Append and durably flush a single event, returning its sequence number.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let seq = self.write_seq;
        let record = WalRecordRef { seq, event };
        let mut json_bytes = serde_json::to_vec(&record)?;
        json_bytes.push(b'\n');
        self.file.write_all(&json_bytes)?;
        self.file.sync_all()?;
        Ok(seq)
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Read every entry with `seq > after`, in order. Used for replay on
    /// recovery and by sibling processes catching up before their own
    /// transaction runs.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        let mut reader = BufReader::new(self.file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut entries = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let record: WalRecord = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "corrupt WAL entry during replay, stopping");
                    break;
                }
            };

            if record.seq > after {
                entries.push(WalEntry {
                    seq: record.seq,
                    event: record.event,
                });
            }
        }

        Ok(entries)
    }

    /// Replace the WAL with only entries at or after `seq`, after a
    /// successful checkpoint. Truncation is best-effort: a crash mid-way
    /// leaves the previous WAL intact.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        let entries = self.entries_after(seq.saturating_sub(1))?;

        let tmp_path = self.path.with_extension("wal.tmp");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            for entry in &entries {
                let record = WalRecordRef {
                    seq: entry.seq,
                    event: &entry.event,
                };
                let mut bytes = serde_json::to_vec(&record)?;
                bytes.push(b'\n');
                tmp_file.write_all(&bytes)?;
            }
            tmp_file.sync_all()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
