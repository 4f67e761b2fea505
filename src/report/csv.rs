use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use super::ReportSink;
use crate::audit::types::{AuditReport, AuditSummary};
use crate::util::time::format_timestamp;

/// Column titles. Spanish matches the historical `seo_audit.csv` export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CsvHeader {
    #[default]
    Es,
    En,
}

impl CsvHeader {
    fn columns(self) -> [&'static str; 3] {
        match self {
            CsvHeader::Es => ["URL", "Publicado", "Estado GSC"],
            CsvHeader::En => ["URL", "Published", "GSC Status"],
        }
    }
}

pub struct CsvSink<W: Write + Send> {
    out: W,
    header: CsvHeader,
}

impl<W: Write + Send> CsvSink<W> {
    pub fn new(out: W, header: CsvHeader) -> Self { Self { out, header } }

    pub fn into_inner(self) -> W { self.out }
}

impl<W: Write + Send> ReportSink for CsvSink<W> {
    fn deliver(&mut self, report: &AuditReport, _summary: &AuditSummary) -> io::Result<()> {
        write_report(&mut self.out, self.header, report)
    }
}

/// Writes the report to `path`. The file is created only on delivery, so an
/// aborted run leaves any earlier report in place.
#[derive(Debug)]
pub struct CsvFileSink {
    path: PathBuf,
    header: CsvHeader,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>, header: CsvHeader) -> Self { Self { path: path.into(), header } }

    pub fn path(&self) -> &Path { &self.path }
}

impl ReportSink for CsvFileSink {
    fn deliver(&mut self, report: &AuditReport, _summary: &AuditSummary) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        write_report(&mut out, self.header, report)
    }
}

fn write_report<W: Write>(out: &mut W, header: CsvHeader, report: &AuditReport) -> io::Result<()> {
    write_record(out, &header.columns())?;
    for row in report.rows() {
        let published = format_timestamp(&row.published_at);
        let status = row.status();
        write_record(out, &[row.url.as_str(), published.as_str(), &*status])?;
    }
    out.flush()
}

fn write_record<W: Write>(w: &mut W, fields: &[&str]) -> io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    writeln!(w, "{}", line.join(","))
}

// RFC 4180: quote fields holding separators, quotes or line breaks
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
