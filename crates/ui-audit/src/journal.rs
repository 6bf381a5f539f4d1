//! Append-only JSON-lines journal of audit results
//!
//! Every record is written as soon as its page has been inspected and the
//! writer is flushed once per page, so a run that dies mid-sweep still
//! leaves every finished page on disk.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::aggregate::IssueAggregator;
use crate::error::AuditResult;
use crate::issue::{CheckResult, ConsoleError, InspectorFailure, IssueRecord, PageError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEntry {
    Issue(IssueRecord),
    Check(CheckResult),
    PageError(PageError),
    InspectorFailure(InspectorFailure),
    ConsoleError(ConsoleError),
    PageInspected { page: String, viewport: String },
}

impl JournalEntry {
    /// Feed this entry into an aggregator
    pub fn apply(self, aggregator: &mut IssueAggregator) {
        match self {
            JournalEntry::Issue(issue) => aggregator.add_issue(issue),
            JournalEntry::Check(check) => aggregator.add_check(check),
            JournalEntry::PageError(error) => aggregator.add_page_error(error),
            JournalEntry::InspectorFailure(failure) => aggregator.add_inspector_failure(failure),
            JournalEntry::ConsoleError(error) => aggregator.add_console_error(error),
            JournalEntry::PageInspected { .. } => aggregator.mark_page_inspected(),
        }
    }
}

pub struct IssueJournal {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl IssueJournal {
    /// Start a fresh journal, truncating any previous run's file
    pub fn create(path: &Path) -> AuditResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        debug!("Journal opened at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    pub fn append(&mut self, entry: &JournalEntry) -> AuditResult<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        self.entries += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> AuditResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Read a journal back. An unterminated final line from an interrupted
    /// run is dropped with a warning, even when the cut falls inside a
    /// multi-byte character; corruption anywhere else is an error.
    pub fn replay(path: &Path) -> AuditResult<Vec<JournalEntry>> {
        let data = fs::read(path)?;
        let segments: Vec<&[u8]> = data.split(|b| *b == b'\n').collect();
        let tail = segments.len() - 1;

        let mut entries = Vec::with_capacity(tail);
        for (index, segment) in segments.iter().enumerate() {
            if segment.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice(segment) {
                Ok(entry) => entries.push(entry),
                Err(e) if index == tail => {
                    warn!("Dropping torn final journal line {}: {}", index + 1, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(entries)
    }

    /// Rebuild an aggregator from a journal on disk
    pub fn rebuild(path: &Path) -> AuditResult<IssueAggregator> {
        let mut aggregator = IssueAggregator::new();
        for entry in Self::replay(path)? {
            entry.apply(&mut aggregator);
        }
        Ok(aggregator)
    }
}
