//! Append-only JSON-lines audit store
//!
//! Each record is written as a single JSON line and flushed immediately.
//! The file is never rewritten; on open the index is rebuilt from it.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::{AuditIndex, AuditStore, Criteria, Page, PageRequest};
use crate::audit::record::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecordId, UserId};

/// Audit store backed by a JSONL file
#[derive(Debug)]
pub struct JsonlAuditStore {
    log_path: PathBuf,
    index: RwLock<AuditIndex>,
    skipped_lines: usize,
    // set when the file ends in an unterminated line
    needs_separator: AtomicBool,
}

impl JsonlAuditStore {
    /// Open (or create) the log at `log_path` and index its records
    ///
    /// Lines that cannot be parsed, such as a torn final write, are skipped
    /// with a warning so the rest of the trail stays readable.
    pub fn open(log_path: impl Into<PathBuf>) -> AuditResult<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuditError::Io(format!("Failed to create audit log directory: {}", e))
            })?;
        }

        let mut index = AuditIndex::new();
        let mut skipped_lines = 0;
        let mut needs_separator = false;

        if log_path.exists() {
            let mut file = File::open(&log_path)
                .map_err(|e| AuditError::Io(format!("Failed to open audit log: {}", e)))?;
            needs_separator = ends_unterminated(&mut file)
                .map_err(|e| AuditError::Io(format!("Failed to inspect audit log tail: {}", e)))?;

            for (line_num, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|e| {
                    AuditError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
                })?;

                if line.trim().is_empty() {
                    continue;
                }

                let parsed = serde_json::from_str::<AuditRecord>(&line)
                    .map_err(AuditError::from)
                    .and_then(|record| index.insert(record));

                if let Err(e) = parsed {
                    skipped_lines += 1;
                    tracing::warn!(line = line_num + 1, error = %e, "skipping unreadable audit log line");
                }
            }
        }

        tracing::debug!(
            path = %log_path.display(),
            records = index.len(),
            skipped = skipped_lines,
            "opened audit log"
        );

        Ok(Self {
            log_path,
            index: RwLock::new(index),
            skipped_lines,
            needs_separator: AtomicBool::new(needs_separator),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Number of lines ignored while rebuilding the index
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    fn read(&self) -> AuditResult<std::sync::RwLockReadGuard<'_, AuditIndex>> {
        self.index
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))
    }
}

/// True when a non-empty file does not end with a newline; rewinds the file
fn ends_unterminated(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(last[0] != b'\n')
}

impl AuditStore for JsonlAuditStore {
    fn append(&self, record: AuditRecord) -> AuditResult<()> {
        let json = serde_json::to_string(&record)
            .map_err(|e| AuditError::Persist(format!("Failed to serialize audit record: {}", e)))?;

        // the write lock also serializes appends to the file
        let mut index = self
            .index
            .write()
            .map_err(|e| AuditError::Persist(format!("Failed to acquire write lock: {}", e)))?;

        if index.contains(record.id()) {
            return Err(AuditError::Persist(format!(
                "duplicate audit record id {}",
                record.id()
            )));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| AuditError::Persist(format!("Failed to open audit log: {}", e)))?;

        // a torn tail must stay on its own line
        let separator = if self.needs_separator.load(Ordering::Acquire) {
            "\n"
        } else {
            ""
        };
        write!(file, "{}{}\n", separator, json)
            .map_err(|e| AuditError::Persist(format!("Failed to write audit record: {}", e)))?;
        self.needs_separator.store(false, Ordering::Release);

        file.flush()
            .map_err(|e| AuditError::Persist(format!("Failed to flush audit log: {}", e)))?;

        index.insert(record)
    }

    fn get(&self, id: AuditRecordId) -> AuditResult<Option<AuditRecord>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn query(&self, criteria: &Criteria, page: PageRequest) -> AuditResult<Page<AuditRecord>> {
        self.read()?.query(criteria, page)
    }

    fn count(&self) -> AuditResult<usize> {
        Ok(self.read()?.len())
    }

    fn distinct_actors(&self) -> AuditResult<Vec<UserId>> {
        Ok(self.read()?.distinct_actors())
    }

    fn distinct_subject_types(&self) -> AuditResult<Vec<String>> {
        Ok(self.read()?.distinct_subject_types())
    }

    fn distinct_actions(&self) -> AuditResult<Vec<String>> {
        Ok(self.read()?.distinct_actions())
    }
}
