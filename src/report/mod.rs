pub mod csv;
pub mod json;

use crate::scan::ScanReport;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Duration result for a single input, as shown in reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDuration {
    pub file_path: String,
    pub file_name: String,
    pub duration_secs: f64,
    pub frame_count: u64,
    /// Bitrate of the last counted frame (kbps)
    pub bitrate: u32,
    pub sample_rate: u32,
    pub version: Option<String>,
    pub layer: Option<String>,
    pub is_vbr: bool,
    pub estimated: bool,
    pub error: Option<String>,
}

impl FileDuration {
    pub fn from_report(file_path: &str, report: &ScanReport) -> Self {
        let last = report.last_frame.as_ref();
        Self {
            file_path: file_path.to_string(),
            file_name: file_name(file_path),
            duration_secs: report.duration_secs,
            frame_count: report.frame_count,
            bitrate: last.map_or(0, |h| h.bitrate),
            sample_rate: last.map_or(0, |h| h.sample_rate),
            version: last.map(|h| h.version.to_string()),
            layer: last.map(|h| h.layer.to_string()),
            is_vbr: report.is_vbr(),
            estimated: report.estimated,
            error: None,
        }
    }

    pub fn from_error(file_path: &str, error: &dyn std::fmt::Display) -> Self {
        Self {
            file_path: file_path.to_string(),
            file_name: file_name(file_path),
            duration_secs: 0.0,
            frame_count: 0,
            bitrate: 0,
            sample_rate: 0,
            version: None,
            layer: None,
            is_vbr: false,
            estimated: false,
            error: Some(error.to_string()),
        }
    }
}

fn file_name(file_path: &str) -> String {
    Path::new(file_path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string())
}

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, results: &[FileDuration]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, results),
        _ => csv::write(&mut file, results),
    }
}

/// Summary statistics for a batch of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub error: usize,
    pub total_duration_secs: f64,
}

impl Summary {
    pub fn from_results(results: &[FileDuration]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for r in results {
            if r.error.is_some() {
                summary.error += 1;
            } else {
                summary.ok += 1;
                summary.total_duration_secs += r.duration_secs;
            }
        }

        summary.total_duration_secs = crate::scan::round_ms(summary.total_duration_secs);
        summary
    }
}
