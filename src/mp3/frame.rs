//! MP3 frame header decoding
//!
//! MP3 frames start with a sync word (11 bits of 1s) followed by header info.
//! Frame header structure (4 bytes):
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//!
//! A = sync (11 bits)
//! B = MPEG version (2 bits): 00=2.5, 01=reserved, 10=2, 11=1
//! C = Layer (2 bits): 00=reserved, 01=III, 10=II, 11=I
//! D = Protection bit (CRC)
//! E = Bitrate index (4 bits)
//! F = Sample rate index (2 bits)
//! G = Padding bit
//! H = Private bit
//! I = Channel mode (2 bits)
//! J = Mode extension (2 bits)
//! K = Copyright
//! L = Original
//! M = Emphasis (2 bits)
//!
//! Decoding never fails. Reserved or unknown fields decode to zero values,
//! which the scanner reads as "not a usable frame here".

use std::fmt;

/// Number of header bytes the decoder looks at.
pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
    Reserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Layer1,
    Layer2,
    Layer3,
    Reserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    /// Bitrate in kbps, 0 for free-format, bad or reserved combinations
    pub bitrate: u32,
    /// Sample rate in Hz, 0 when the index or version is reserved
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
    /// Frame length in bytes including the header, 0 when it cannot be computed
    pub frame_size: u32,
    pub samples_per_frame: u32,
}

// Bitrate lookup tables (kbps)
// Index 0 = free, 15 = bad
const BITRATES_V1_L3: [u32; 16] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0];
const BITRATES_V1_L2: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0];
const BITRATES_V1_L1: [u32; 16] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0];
const BITRATES_V2_L3: [u32; 16] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0];
const BITRATES_V2_L2: [u32; 16] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0];
const BITRATES_V2_L1: [u32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0];

// Sample rate lookup tables (Hz)
// Index 3 = reserved
const SAMPLE_RATES_V1: [u32; 4] = [44100, 48000, 32000, 0];
const SAMPLE_RATES_V2: [u32; 4] = [22050, 24000, 16000, 0];
const SAMPLE_RATES_V25: [u32; 4] = [11025, 12000, 8000, 0];

impl MpegVersion {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => MpegVersion::Reserved,
        }
    }
}

impl Layer {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            1 => Layer::Layer3,
            2 => Layer::Layer2,
            3 => Layer::Layer1,
            _ => Layer::Reserved,
        }
    }
}

impl ChannelMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        }
    }
}

impl fmt::Display for MpegVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpegVersion::Mpeg1 => write!(f, "MPEG-1"),
            MpegVersion::Mpeg2 => write!(f, "MPEG-2"),
            MpegVersion::Mpeg25 => write!(f, "MPEG-2.5"),
            MpegVersion::Reserved => write!(f, "reserved"),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Layer1 => write!(f, "Layer I"),
            Layer::Layer2 => write!(f, "Layer II"),
            Layer::Layer3 => write!(f, "Layer III"),
            Layer::Reserved => write!(f, "reserved"),
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelMode::Stereo => write!(f, "stereo"),
            ChannelMode::JointStereo => write!(f, "joint stereo"),
            ChannelMode::DualChannel => write!(f, "dual channel"),
            ChannelMode::Mono => write!(f, "mono"),
        }
    }
}

/// Check for the 11-bit frame sync pattern `11111111 111xxxxx`
pub fn has_sync(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0
}

fn bitrate_kbps(version: MpegVersion, layer: Layer, index: usize) -> u32 {
    // MPEG2 and MPEG2.5 share the "V2" tables
    let table = match (version, layer) {
        (MpegVersion::Reserved, _) | (_, Layer::Reserved) => return 0,
        (MpegVersion::Mpeg1, Layer::Layer1) => &BITRATES_V1_L1,
        (MpegVersion::Mpeg1, Layer::Layer2) => &BITRATES_V1_L2,
        (MpegVersion::Mpeg1, Layer::Layer3) => &BITRATES_V1_L3,
        (_, Layer::Layer1) => &BITRATES_V2_L1,
        (_, Layer::Layer2) => &BITRATES_V2_L2,
        (_, Layer::Layer3) => &BITRATES_V2_L3,
    };
    table[index & 0x0F]
}

fn sample_rate_hz(version: MpegVersion, index: usize) -> u32 {
    let table = match version {
        MpegVersion::Mpeg1 => &SAMPLE_RATES_V1,
        MpegVersion::Mpeg2 => &SAMPLE_RATES_V2,
        MpegVersion::Mpeg25 => &SAMPLE_RATES_V25,
        MpegVersion::Reserved => return 0,
    };
    table[index & 0x03]
}

fn samples_per_frame(version: MpegVersion, layer: Layer) -> u32 {
    match (version, layer) {
        (MpegVersion::Reserved, _) | (_, Layer::Reserved) => 0,
        (MpegVersion::Mpeg1, Layer::Layer1) => 384,
        (MpegVersion::Mpeg1, Layer::Layer2) => 1152,
        (MpegVersion::Mpeg1, Layer::Layer3) => 1152,
        (_, Layer::Layer1) => 384,
        (_, Layer::Layer2) => 1152,
        (_, Layer::Layer3) => 576,
    }
}

/// `floor(samples * kbps * 125 / rate)` plus the padding slot.
///
/// Returns 0 whenever the sample rate or sample count is unknown, so a
/// reserved field can never produce a frame length.
fn frame_size(layer: Layer, samples: u32, bitrate: u32, sample_rate: u32, padding: bool) -> u32 {
    if sample_rate == 0 || samples == 0 {
        return 0;
    }

    let padding_size = if padding {
        match layer {
            Layer::Layer1 => 4,
            _ => 1,
        }
    } else {
        0
    };

    samples * bitrate * 125 / sample_rate + padding_size
}

impl FrameHeader {
    /// Decode a 4-byte MP3 frame header
    ///
    /// The sync word is not checked here; callers gate on [`has_sync`] first.
    pub fn decode(header: [u8; HEADER_LEN]) -> Self {
        // MPEG version (bits 4-3 of byte 1)
        let version = MpegVersion::from_bits(header[1] >> 3);

        // Layer (bits 2-1 of byte 1)
        let layer = Layer::from_bits(header[1] >> 1);

        // Bitrate index (bits 7-4 of byte 2)
        let bitrate = bitrate_kbps(version, layer, ((header[2] >> 4) & 0x0F) as usize);

        // Sample rate index (bits 3-2 of byte 2)
        let sample_rate = sample_rate_hz(version, ((header[2] >> 2) & 0x03) as usize);

        // Padding (bit 1 of byte 2)
        let padding = (header[2] & 0x02) != 0;

        // Channel mode (bits 7-6 of byte 3)
        let channel_mode = ChannelMode::from_bits(header[3] >> 6);

        let samples_per_frame = samples_per_frame(version, layer);
        let frame_size = frame_size(layer, samples_per_frame, bitrate, sample_rate, padding);

        FrameHeader {
            version,
            layer,
            bitrate,
            sample_rate,
            padding,
            channel_mode,
            frame_size,
            samples_per_frame,
        }
    }

    /// Decode the first four bytes of `bytes`, if there are that many
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let header: [u8; HEADER_LEN] = bytes.get(..HEADER_LEN)?.try_into().ok()?;
        Some(Self::decode(header))
    }

    /// A frame the scanner can step over and count
    pub fn is_usable(&self) -> bool {
        self.frame_size > 0 && self.samples_per_frame > 0
    }

    /// Playback time covered by this frame, in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        f64::from(self.samples_per_frame) / f64::from(self.sample_rate)
    }
}
