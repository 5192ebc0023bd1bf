//! # mp3-duration
//!
//! Compute how long an MP3 stream plays without decoding any audio.
//!
//! The scanner skips a leading ID3v2 tag, then walks frame headers one after
//! another, adding up each frame's `samples / sample_rate`. Junk bytes,
//! broken headers and ID3v1 trailers are stepped over rather than treated as
//! errors. For constant-bitrate files a much faster estimate can be taken from
//! the first frame's bitrate and the size of the file.
//!
//! ## Quick start
//!
//! ```no_run
//! let secs = mp3_duration::compute_duration("song.mp3", false)?;
//! println!("{secs:.3}s");
//!
//! let bytes = std::fs::read("song.mp3")?;
//! let estimate = mp3_duration::duration_from_bytes(&bytes, true);
//! # let _ = estimate;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod mp3;
pub mod report;
pub mod scan;

pub use config::Config;
pub use error::{Error, Result};
pub use mp3::{FrameHeader, Layer, MpegVersion};
pub use scan::source::{ByteSource, Input, ReaderSource, SliceSource};
pub use scan::{ScanReport, Scanner};

/// Duration in seconds of a file path or an in-memory MP3 stream
///
/// With `cbr_estimate` set, the scan stops at the first frame that has a
/// bitrate and extrapolates from the bytes that follow it.
///
/// A path that does not name a regular file fails before anything is read.
pub fn compute_duration(input: impl Into<Input>, cbr_estimate: bool) -> Result<f64> {
    let report = Scanner::new()
        .with_cbr_estimate(cbr_estimate)
        .scan_input(&input.into())?;
    Ok(report.duration_secs)
}

/// Duration in seconds of an MP3 stream held in memory
pub fn duration_from_bytes(bytes: &[u8], cbr_estimate: bool) -> f64 {
    Scanner::new()
        .with_cbr_estimate(cbr_estimate)
        .scan_bytes(bytes)
        .duration_secs
}
