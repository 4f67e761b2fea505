//! Destinations for a finished audit report.

pub mod csv;

use std::io;

use crate::audit::types::{AuditReport, AuditSummary};

pub use self::csv::{CsvFileSink, CsvHeader, CsvSink};

/// Receives the report once, after the inspection loop. Aborted runs never
/// reach a sink.
pub trait ReportSink: Send {
    fn deliver(&mut self, report: &AuditReport, summary: &AuditSummary) -> io::Result<()>;
}

/// Keeps delivered reports in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    pub delivered: Vec<(AuditReport, AuditSummary)>,
}

#[cfg(test)]
impl ReportSink for MemorySink {
    fn deliver(&mut self, report: &AuditReport, summary: &AuditSummary) -> io::Result<()> {
        self.delivered.push((report.clone(), *summary));
        Ok(())
    }
}

/// Used when only the log summary and envelope are wanted.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn deliver(&mut self, _report: &AuditReport, _summary: &AuditSummary) -> io::Result<()> {
        Ok(())
    }
}
