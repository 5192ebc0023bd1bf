//! JSON report generation

use crate::report::{FileDuration, Summary};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    summary: JsonSummary,
    files: &'a [FileDuration],
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    ok: usize,
    error: usize,
    total_duration_secs: f64,
}

pub fn write<W: Write>(writer: &mut W, results: &[FileDuration]) -> io::Result<()> {
    let summary = Summary::from_results(results);

    let report = JsonReport {
        generated: chrono::Utc::now().to_rfc3339(),
        summary: JsonSummary {
            total: summary.total,
            ok: summary.ok,
            error: summary.error,
            total_duration_secs: summary.total_duration_secs,
        },
        files: results,
    };

    serde_json::to_writer_pretty(&mut *writer, &report).map_err(io::Error::other)?;
    writeln!(writer)
}
