// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of domain events.
//!
//! Format: one JSON object per line, `{"seq": N, "event": {...}}`. Sequence
//! numbers start at 1 and never repeat. A torn final line (crash mid-append)
//! is dropped at open; everything before it is kept.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vg_core::Event;

/// Errors from WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One persisted log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// The append-only event log.
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
}

impl Wal {
    /// Open (or create) the log at `path`, recovering the last written
    /// sequence number. `base_seq` is the newest sequence already covered
    /// by a snapshot — after compaction the file may be empty, and numbering
    /// must continue from there, never restart. A corrupt tail is truncated
    /// away with a warning.
    pub fn open(path: impl AsRef<Path>, base_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let mut write_seq = base_seq;
        let mut good_bytes = 0u64;
        let mut corrupt = false;

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                match serde_json::from_str::<WalEntry>(&line) {
                    Ok(entry) => {
                        write_seq = write_seq.max(entry.seq);
                        good_bytes += line.len() as u64 + 1;
                    }
                    Err(_) => {
                        corrupt = true;
                        break;
                    }
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        if corrupt {
            tracing::warn!(
                path = %path.display(),
                kept_seq = write_seq,
                "dropping corrupt WAL tail"
            );
            file.set_len(good_bytes)?;
        }
        Ok(Self { path, writer: BufWriter::new(file), write_seq })
    }

    /// Highest sequence number written so far (0 for an empty log).
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Append one event, returning its sequence number. Buffered; call
    /// [`flush`](Self::flush) to push it to the OS.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.write_seq = seq;
        Ok(seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        Ok(())
    }

    /// All entries with `seq > after`, in order. Used for replay on top of
    /// a snapshot.
    pub fn entries_after(&mut self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        self.flush()?;
        let mut entries = Vec::new();
        let reader = BufReader::new(File::open(&self.path)?);
        for line in reader.lines() {
            let line = line?;
            match serde_json::from_str::<WalEntry>(&line) {
                Ok(entry) if entry.seq > after => entries.push(entry),
                Ok(_) => {}
                // tail corruption was handled at open; a mid-file parse
                // failure means the rest is unreadable
                Err(_) => break,
            }
        }
        Ok(entries)
    }

    /// Drop entries with `seq <= upto` (they are covered by a snapshot).
    /// Rewrites the log through a temp file and swaps it in.
    pub fn truncate_before(&mut self, upto: u64) -> Result<(), WalError> {
        let keep = self.entries_after(upto)?;
        let tmp = self.path.with_extension("wal.tmp");
        {
            let mut out = BufWriter::new(File::create(&tmp)?);
            for entry in &keep {
                let line = serde_json::to_string(entry)?;
                out.write_all(line.as_bytes())?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
