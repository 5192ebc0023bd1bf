//! CSV report generation

use crate::report::FileDuration;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, results: &[FileDuration]) -> io::Result<()> {
    // Header
    writeln!(
        writer,
        "status,filepath,duration_secs,frames,bitrate_kbps,sample_rate_hz,vbr,estimated,error"
    )?;

    // Rows
    for r in results {
        let status = if r.error.is_some() { "ERROR" } else { "OK" };
        let error = r.error.as_deref().unwrap_or("-");

        writeln!(
            writer,
            "{},{},{:.3},{},{},{},{},{},{}",
            status,
            escape_csv(&r.file_path),
            r.duration_secs,
            r.frame_count,
            r.bitrate,
            r.sample_rate,
            r.is_vbr,
            r.estimated,
            escape_csv(error)
        )?;
    }

    Ok(())
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
