//! File-backed record source and sink using JSON Lines.
//!
//! Each line is one row: `{"id": 42, "value": "..."}`. Blank lines are
//! ignored. This lets the runner work on a table dump without a database.

use std::io::{BufRead, Lines, Write};

use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::error::{RelinkError, Result};
use crate::migrate::{Record, RecordSink, RecordSource, RowId};

/// One JSON Lines row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub value: String,
}

/// Reads rows from JSON Lines and keeps only those containing the needle.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    needle: Vec<u8>,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, needle: &str) -> Self {
        Self {
            lines: reader.lines(),
            needle: needle.as_bytes().to_vec(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Rows read but filtered out because they do not contain the needle.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let row = serde_json::from_str(&line)
                .map_err(|e| RelinkError::Source(format!("line {}: {}", self.line_no, e)))?;
            return Ok(Some(row));
        }
        Ok(None)
    }
}

impl<R: BufRead> RecordSource for JsonLinesSource<R> {
    fn next_batch(&mut self, max: usize) -> Result<Vec<Record>> {
        let mut batch = Vec::new();
        while batch.len() < max {
            let Some(row) = self.next_row()? else {
                break;
            };
            if memmem::find(row.value.as_bytes(), &self.needle).is_none() {
                self.skipped += 1;
                continue;
            }
            batch.push(Record::new(row.id, row.value));
        }
        Ok(batch)
    }
}

/// Writes each update as a JSON Lines row. Every update counts as affected.
pub struct JsonLinesSink<W> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn update(&mut self, id: RowId, payload: &[u8]) -> Result<bool> {
        let value = String::from_utf8(payload.to_vec())
            .map_err(|e| RelinkError::Sink(format!("row {}: payload is not UTF-8: {}", id, e)))?;
        serde_json::to_writer(&mut self.writer, &Row { id, value })?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(true)
    }
}

/// Totals from [`scan_references`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub rows: usize,
    pub referencing: usize,
}

/// Count rows in a JSON Lines dump that still contain `needle`.
pub fn scan_references<R: BufRead>(reader: R, needle: &str) -> Result<ScanReport> {
    let mut source = JsonLinesSource::new(reader, needle);
    let mut report = ScanReport::default();
    while let Some(row) = source.next_row()? {
        report.rows += 1;
        if memmem::find(row.value.as_bytes(), needle.as_bytes()).is_some() {
            report.referencing += 1;
        }
    }
    Ok(report)
}
