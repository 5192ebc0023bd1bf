//! Duration scanning
//!
//! Walks an MP3 stream frame by frame, adding up `samples / sample_rate` for
//! every frame header it can read. Anything that is not a frame (junk,
//! broken headers, ID3v1 trailers) is stepped over so a damaged file still
//! yields the duration of the audio that is there.

pub mod source;

use std::io;

use tracing::{debug, trace};

use crate::error::Result;
use crate::mp3::frame::{self, FrameHeader};
use crate::mp3::id3::{self, ID3V1_TAG_LEN};
use source::{open_file, ByteSource, Input, SliceSource};

/// Streams shorter than this are not worth scanning
pub const MIN_STREAM_LEN: usize = 100;

/// Bytes requested per scan step
const WINDOW_LEN: usize = 10;

/// Round to the nearest millisecond
pub fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Extrapolate a constant-bitrate duration from the bytes left after `offset`
pub fn estimate_duration(bitrate_kbps: u32, offset: u64, total_len: u64) -> f64 {
    if bitrate_kbps == 0 {
        return 0.0;
    }
    let remaining = total_len.saturating_sub(offset) as f64;
    round_ms(remaining * 8.0 / (f64::from(bitrate_kbps) * 1000.0))
}

/// Outcome of a scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Playback time in seconds, rounded to the millisecond
    pub duration_secs: f64,
    /// Length of the scanned stream in bytes
    pub stream_len: u64,
    /// Where audio starts once a leading ID3v2 tag is skipped
    pub audio_offset: u64,
    /// Frames stepped over before the scan stopped
    pub frame_count: u64,
    /// Last frame header that could be stepped over
    pub last_frame: Option<FrameHeader>,
    pub min_bitrate: u32,
    pub max_bitrate: u32,
    /// Duration was extrapolated from a single frame's bitrate
    pub estimated: bool,
}

impl ScanReport {
    fn record(&mut self, frame: FrameHeader) {
        if self.frame_count == 0 {
            self.min_bitrate = frame.bitrate;
            self.max_bitrate = frame.bitrate;
        } else {
            self.min_bitrate = self.min_bitrate.min(frame.bitrate);
            self.max_bitrate = self.max_bitrate.max(frame.bitrate);
        }
        self.frame_count += 1;
        self.last_frame = Some(frame);
    }

    /// More than one bitrate seen across the counted frames
    pub fn is_vbr(&self) -> bool {
        self.min_bitrate != self.max_bitrate
    }
}

/// Frame-walking duration scanner
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    /// Stop at the first frame with a bitrate and extrapolate from it
    pub cbr_estimate: bool,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cbr_estimate(mut self, cbr_estimate: bool) -> Self {
        self.cbr_estimate = cbr_estimate;
        self
    }

    /// Scan a byte source and report its duration
    ///
    /// Malformed data never fails the scan; only the source's own I/O errors
    /// are returned.
    pub fn scan<S: ByteSource>(&self, source: &mut S) -> io::Result<ScanReport> {
        let total_len = source.size()?;
        let mut report = ScanReport {
            stream_len: total_len,
            ..ScanReport::default()
        };

        let mut head = [0u8; MIN_STREAM_LEN];
        if source.read_at(0, &mut head)? < MIN_STREAM_LEN {
            debug!(total_len, "stream too short to hold audio");
            return Ok(report);
        }

        let mut offset = id3::skip_tag(&head);
        report.audio_offset = offset;
        if offset > 0 {
            debug!(offset, "skipping ID3v2 tag");
        }

        let mut window = [0u8; WINDOW_LEN];
        let mut duration = 0.0;

        while offset < total_len {
            if source.read_at(offset, &mut window)? < WINDOW_LEN {
                break;
            }

            if frame::has_sync(&window) {
                let header = FrameHeader::decode([window[0], window[1], window[2], window[3]]);
                if header.is_usable() {
                    offset += u64::from(header.frame_size);
                    duration += header.duration_secs();
                    report.record(header);
                } else {
                    trace!(offset, "unusable frame header, resyncing");
                    offset += 1;
                }
            } else if id3::is_id3v1(&window) {
                trace!(offset, "skipping ID3v1 tag");
                offset += ID3V1_TAG_LEN;
            } else {
                offset += 1;
            }

            // A free-format frame carries no bitrate to extrapolate from
            if let Some(header) = report.last_frame.filter(|h| self.cbr_estimate && h.bitrate > 0) {
                report.duration_secs = estimate_duration(header.bitrate, offset, total_len);
                report.estimated = true;
                debug!(
                    bitrate = header.bitrate,
                    offset,
                    duration = report.duration_secs,
                    "estimated constant-bitrate duration"
                );
                return Ok(report);
            }
        }

        report.duration_secs = round_ms(duration);
        debug!(
            frames = report.frame_count,
            duration = report.duration_secs,
            "scan complete"
        );
        Ok(report)
    }

    /// Scan a path or an in-memory buffer
    pub fn scan_input(&self, input: &Input) -> Result<ScanReport> {
        let report = match input {
            Input::Path(path) => self.scan(&mut open_file(path)?)?,
            Input::Bytes(bytes) => self.scan_bytes(bytes),
        };
        Ok(report)
    }

    /// Scan a buffer already in memory
    pub fn scan_bytes(&self, bytes: &[u8]) -> ScanReport {
        // Slices cannot fail to read
        self.scan(&mut SliceSource::new(bytes)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==========================================================================
    // FIXTURES
    // ==========================================================================
    //
    // MPEG1 Layer3 128kbps 44.1kHz, no padding: 417 bytes, 1152 samples.
    // Frame bodies are zero-filled; the scanner never looks inside them.
    // ==========================================================================

    const HEADER_128: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
    const FRAME_LEN: usize = 417;

    fn frame_bytes(header: [u8; 4], len: usize) -> Vec<u8> {
        let mut data = header.to_vec();
        data.resize(len, 0);
        data
    }

    fn frames(count: usize) -> Vec<u8> {
        (0..count).flat_map(|_| frame_bytes(HEADER_128, FRAME_LEN)).collect()
    }

    fn expected_secs(count: usize, samples: f64, rate: f64) -> f64 {
        round_ms(count as f64 * samples / rate)
    }

    fn assert_secs(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}s, got {actual}s"
        );
    }

    /// Counts reads so tests can check how much of a stream was touched
    struct CountingSource<'a> {
        inner: SliceSource<'a>,
        reads: usize,
    }

    impl ByteSource for CountingSource<'_> {
        fn size(&mut self) -> io::Result<u64> {
            self.inner.size()
        }

        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            self.inner.read_at(offset, buf)
        }
    }

    // ==========================================================================
    // BASIC SCANS
    // ==========================================================================

    #[test]
    fn test_short_stream_is_zero() {
        let report = Scanner::new().scan_bytes(&[0xFF; 99]);
        assert_eq!(report.duration_secs, 0.0);
        assert_eq!(report.frame_count, 0);

        assert_eq!(Scanner::new().scan_bytes(&[]).duration_secs, 0.0);
    }

    #[test]
    fn test_consecutive_frames() {
        let report = Scanner::new().scan_bytes(&frames(10));

        assert_eq!(report.frame_count, 10);
        assert_secs(report.duration_secs, expected_secs(10, 1152.0, 44100.0));
        assert_eq!(report.min_bitrate, 128);
        assert_eq!(report.max_bitrate, 128);
        assert!(!report.is_vbr());
        assert!(!report.estimated);
        assert_eq!(report.last_frame.map(|h| h.sample_rate), Some(44100));
    }

    #[test]
    fn test_mpeg2_layer3_frames() {
        // MPEG2 Layer3 80kbps 22050Hz: 261 bytes, 576 samples
        let data: Vec<u8> = (0..5)
            .flat_map(|_| frame_bytes([0xFF, 0xF3, 0x90, 0x00], 261))
            .collect();
        let report = Scanner::new().scan_bytes(&data);

        assert_eq!(report.frame_count, 5);
        assert_secs(report.duration_secs, expected_secs(5, 576.0, 22050.0));
    }

    #[test]
    fn test_skips_id3v2_tag() {
        // 20 byte tag body full of sync-looking bytes that must not be read
        let mut data = vec![b'I', b'D', b'3', 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x14];
        data.extend([0xFF; 20]);
        data.extend(frames(3));

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.audio_offset, 30);
        assert_eq!(report.frame_count, 3);
        assert_secs(report.duration_secs, expected_secs(3, 1152.0, 44100.0));
    }

    #[test]
    fn test_junk_before_first_frame() {
        let mut data = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        data.extend(frames(2));

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.frame_count, 2);
    }

    #[test]
    fn test_id3v1_trailer_skipped() {
        let mut data = frames(4);
        let mut tag = b"TAG".to_vec();
        tag.resize(128, b' ');
        data.extend(tag);

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.frame_count, 4);
        assert_secs(report.duration_secs, expected_secs(4, 1152.0, 44100.0));
    }

    #[test]
    fn test_only_id3v1_trailer_is_zero() {
        let mut data = b"TAG".to_vec();
        data.resize(128, 0);

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.duration_secs, 0.0);
        assert_eq!(report.frame_count, 0);
    }

    #[test]
    fn test_reserved_header_resyncs() {
        let mut data = frames(2);
        // Sync bits present but version reserved: stepped over a byte at a time
        data.extend([0xFF, 0xEB, 0x92, 0x00]);
        data.extend(frames(2));

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.frame_count, 4);
        assert_secs(report.duration_secs, expected_secs(4, 1152.0, 44100.0));
    }

    #[test]
    fn test_reserved_layer_resyncs() {
        let mut data = frames(2);
        data.extend([0xFF, 0xE0, 0x92, 0x00]);
        data.extend(frames(1));

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.frame_count, 3);
    }

    #[test]
    fn test_truncated_tail_window_stops_scan() {
        let mut data = frames(3);
        data.extend([0xFF, 0xFB, 0x90, 0x00, 0x00]);

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.frame_count, 3);
    }

    #[test]
    fn test_frame_running_past_end_still_counts() {
        // The last header is readable even though its body is cut short
        let mut data = frames(3);
        data.extend(frame_bytes(HEADER_128, 200));

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.frame_count, 4);
    }

    #[test]
    fn test_vbr_bitrates_tracked() {
        // 128kbps then 160kbps (522 bytes)
        let mut data = frames(2);
        data.extend(frame_bytes([0xFF, 0xFB, 0xA0, 0x00], 522));

        let report = Scanner::new().scan_bytes(&data);
        assert_eq!(report.frame_count, 3);
        assert!(report.is_vbr());
        assert_eq!(report.min_bitrate, 128);
        assert_eq!(report.max_bitrate, 160);
    }

    // ==========================================================================
    // CBR ESTIMATE
    // ==========================================================================
    //
    // With the estimate on, the scan stops after the first frame with a
    // bitrate and extrapolates from the bytes left *after* that frame.
    // ==========================================================================

    #[test]
    fn test_estimate_duration_formula() {
        // 16000 bytes at 128kbps = 16000 * 8 / 128000 = 1.0s
        assert_secs(estimate_duration(128, 0, 16000), 1.0);
        assert_secs(estimate_duration(128, 417, 16417), 1.0);
        assert_eq!(estimate_duration(128, 20000, 16000), 0.0);
        assert_eq!(estimate_duration(0, 0, 16000), 0.0);
    }

    #[test]
    fn test_round_ms() {
        assert_secs(round_ms(1.23449), 1.234);
        assert_secs(round_ms(1.2346), 1.235);
        assert_eq!(round_ms(0.0), 0.0);
    }

    #[test]
    fn test_cbr_estimate_from_first_frame() {
        let data = frames(50);
        let report = Scanner::new().with_cbr_estimate(true).scan_bytes(&data);

        assert!(report.estimated);
        assert_eq!(report.frame_count, 1);
        // 49 frames of 417 bytes left at 128kbps
        assert_secs(report.duration_secs, estimate_duration(128, FRAME_LEN as u64, data.len() as u64));
        assert_secs(report.duration_secs, round_ms(49.0 * 417.0 * 8.0 / 128_000.0));
    }

    #[test]
    fn test_cbr_estimate_agrees_with_full_scan() {
        let data = frames(200);
        let full = Scanner::new().scan_bytes(&data).duration_secs;
        let cbr = Scanner::new().with_cbr_estimate(true).scan_bytes(&data).duration_secs;

        assert!(full > 0.0);
        assert!(((full - cbr) / full).abs() < 0.05, "full {full}s vs cbr {cbr}s");
    }

    #[test]
    fn test_cbr_estimate_reads_constant_amount() {
        for count in [10, 1000] {
            let data = frames(count);
            let mut source = CountingSource {
                inner: SliceSource::new(&data),
                reads: 0,
            };
            let report = Scanner::new().with_cbr_estimate(true).scan(&mut source).unwrap();
            assert!(report.estimated);
            // Leading 100 bytes plus one header window
            assert_eq!(source.reads, 2);
        }
    }

    #[test]
    fn test_cbr_estimate_after_id3v2_tag() {
        let mut data = vec![b'I', b'D', b'3', 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x14];
        data.extend([0u8; 20]);
        data.extend(frames(20));
        let total = data.len() as u64;

        let report = Scanner::new().with_cbr_estimate(true).scan_bytes(&data);
        assert_secs(report.duration_secs, estimate_duration(128, 30 + FRAME_LEN as u64, total));
    }

    #[test]
    fn test_cbr_estimate_skips_free_format_frame() {
        // A padded free-format header is a 1 byte frame with no bitrate
        let mut data = vec![0xFF, 0xFB, 0x02, 0x00];
        data.extend(frames(10));
        let total = data.len() as u64;

        let report = Scanner::new().with_cbr_estimate(true).scan_bytes(&data);
        assert!(report.estimated);
        assert_eq!(report.frame_count, 2);
        assert_secs(report.duration_secs, estimate_duration(128, 4 + FRAME_LEN as u64, total));
    }

    #[test]
    fn test_cbr_estimate_without_frames_falls_back() {
        let report = Scanner::new().with_cbr_estimate(true).scan_bytes(&[0u8; 500]);
        assert!(!report.estimated);
        assert_eq!(report.duration_secs, 0.0);
    }

    #[test]
    fn test_scan_input_bytes() {
        let input = Input::Bytes(frames(3));
        let report = Scanner::new().scan_input(&input).unwrap();
        assert_eq!(report.frame_count, 3);
    }

    // ==========================================================================
    // RESYNC PROPERTY
    // ==========================================================================
    //
    // One stray byte that is neither a sync byte nor part of a header costs a
    // single step and nothing else: every real frame is still found.
    // ==========================================================================

    proptest! {
        #[test]
        fn prop_stray_byte_keeps_all_frames(
            count in 1usize..8,
            position in any::<proptest::sample::Index>(),
            junk in any::<u8>().prop_filter("not a sync byte", |b| *b != 0xFF),
        ) {
            let mut data = frames(count);
            let mut at = position.index(data.len() + 1);
            // Don't split a header apart
            if at % FRAME_LEN > 0 && at % FRAME_LEN < 4 {
                at -= at % FRAME_LEN;
            }
            data.insert(at, junk);

            let report = Scanner::new().scan_bytes(&data);
            prop_assert_eq!(report.frame_count, count as u64);
            prop_assert!((report.duration_secs - expected_secs(count, 1152.0, 44100.0)).abs() < 1e-9);
        }
    }
}
