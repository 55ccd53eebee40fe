//! Drive the rewrite engine over a record source and into a record sink.
//!
//! The runner pulls rows from a [`RecordSource`] in batches, rewrites each
//! batch on a bounded worker pool, and writes every changed row to a
//! [`RecordSink`] exactly once. There are no retries and no cross-row
//! transaction: a run that stops early, whether cancelled or failed, leaves
//! the rows it already wrote in place.
//!
//! The source owns the containment filter; rows it yields are expected to
//! contain the old URL somewhere. See [`crate::like_pattern`] for SQL-backed
//! sources.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::engine::{normalize_base_url, process_detailed, FieldOutcome, PayloadKind};
use crate::error::{RelinkError, Result};

/// Identifier of a row in the underlying store.
pub type RowId = u64;

/// One candidate field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RowId,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn new(id: RowId, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

/// Yields rows whose payload contains the old URL.
pub trait RecordSource {
    /// Return up to `max` rows. An empty batch means the source is exhausted.
    fn next_batch(&mut self, max: usize) -> Result<Vec<Record>>;
}

/// Applies single-row updates.
pub trait RecordSink {
    /// Replace the payload of row `id`. Returns whether a row was affected.
    fn update(&mut self, id: RowId, payload: &[u8]) -> Result<bool>;
}

/// Default number of rows pulled from the source per batch.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Settings for one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub old_url: String,
    pub new_url: String,
    /// Worker threads in the rewrite pool.
    pub workers: usize,
    /// Rows pulled from the source per batch.
    pub batch_size: usize,
    /// Compute everything, write nothing.
    pub dry_run: bool,
}

impl RunConfig {
    /// Build a config with normalized URLs and default tuning.
    pub fn new(old_url: &str, new_url: &str) -> Result<Self> {
        let config = Self {
            old_url: normalize_base_url(old_url.trim()).to_string(),
            new_url: normalize_base_url(new_url.trim()).to_string(),
            workers: default_workers(),
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check the settings before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.old_url.is_empty() {
            return Err(RelinkError::Config("old URL must not be empty".into()));
        }
        if self.new_url.is_empty() {
            return Err(RelinkError::Config("new URL must not be empty".into()));
        }
        if self.old_url == self.new_url {
            return Err(RelinkError::Config(format!(
                "old and new URL are identical: {}",
                self.old_url
            )));
        }
        if self.workers == 0 {
            return Err(RelinkError::Config("workers must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(RelinkError::Config("batch size must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run-level cancellation. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop scheduling further batches. Rows already written stay written.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters for a finished (or stopped) run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Rows received from the source.
    pub scanned: usize,
    /// Rows whose payload changed.
    pub changed: usize,
    /// Rows left as they were.
    pub unchanged: usize,
    /// Rows handled as serialized values.
    pub structured: usize,
    /// Rows handled as plain text.
    pub opaque: usize,
    /// Occurrences of the old URL replaced across all rows.
    pub replacements: usize,
    /// Rows the sink confirmed as updated.
    pub updated: usize,
    /// Changed rows the sink reported as not affected.
    pub not_affected: usize,
    /// The run stopped on a cancellation request.
    pub cancelled: bool,
}

impl Report {
    fn record(&mut self, outcome: &FieldOutcome) {
        self.scanned += 1;
        match outcome.kind {
            PayloadKind::Structured => self.structured += 1,
            PayloadKind::Opaque => self.opaque += 1,
        }
        if outcome.is_changed() {
            self.changed += 1;
            self.replacements += outcome.replacements;
        } else {
            self.unchanged += 1;
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scanned:      {}", self.scanned)?;
        writeln!(f, "Serialized:   {}", self.structured)?;
        writeln!(f, "Plain text:   {}", self.opaque)?;
        writeln!(f, "Changed:      {}", self.changed)?;
        writeln!(f, "Unchanged:    {}", self.unchanged)?;
        writeln!(f, "Replacements: {}", self.replacements)?;
        writeln!(f, "Updated:      {}", self.updated)?;
        write!(f, "Not affected: {}", self.not_affected)?;
        if self.cancelled {
            write!(f, "\nRun was cancelled before the source was exhausted")?;
        }
        Ok(())
    }
}

/// Migrate every row from `source` into `sink`.
///
/// Source and sink failures abort the run with an error; a field that cannot
/// be decoded is rewritten as plain text and never aborts anything.
pub fn run(
    source: &mut dyn RecordSource,
    sink: &mut dyn RecordSink,
    config: &RunConfig,
    cancel: &CancelToken,
) -> Result<Report> {
    config.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("relink-worker-{i}"))
        .build()
        .map_err(|e| RelinkError::Pool(e.to_string()))?;

    info!(
        old = %config.old_url,
        new = %config.new_url,
        workers = config.workers,
        batch_size = config.batch_size,
        dry_run = config.dry_run,
        "starting migration"
    );

    let old = config.old_url.as_bytes();
    let new = config.new_url.as_bytes();
    let mut report = Report::default();

    loop {
        if cancel.is_cancelled() {
            warn!(scanned = report.scanned, "migration cancelled");
            report.cancelled = true;
            break;
        }

        let batch = source.next_batch(config.batch_size)?;
        if batch.is_empty() {
            break;
        }

        let outcomes: Vec<FieldOutcome> = pool.install(|| {
            batch
                .par_iter()
                .map(|record| process_detailed(&record.payload, old, new))
                .collect()
        });

        for (record, outcome) in batch.iter().zip(outcomes) {
            report.record(&outcome);
            let Some(payload) = outcome.payload else {
                continue;
            };
            debug!(
                id = record.id,
                kind = ?outcome.kind,
                replacements = outcome.replacements,
                "row rewritten"
            );
            if config.dry_run {
                continue;
            }
            if sink.update(record.id, &payload)? {
                report.updated += 1;
            } else {
                warn!(id = record.id, "update affected no row");
                report.not_affected += 1;
            }
        }
        debug!(rows = batch.len(), scanned = report.scanned, "batch done");
    }

    info!(
        scanned = report.scanned,
        changed = report.changed,
        updated = report.updated,
        replacements = report.replacements,
        "migration finished"
    );
    Ok(report)
}
