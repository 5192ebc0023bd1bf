//! ID3 tag detection
//!
//! ID3v2 sits in front of the audio frames:
//! "ID3" (3) + version (2) + flags (1) + size (4) = 10 byte header,
//! followed by the tag body and, if flag bit 0x10 is set, a 10 byte footer.
//!
//! The size is a synchsafe integer: 4 bytes carrying 7 bits each, so no byte
//! of the header can look like the start of a frame sync.
//!
//! ID3v1 is a fixed 128 byte block starting with "TAG", usually at the end of
//! the file. Only its presence matters here; its fields are never read.

/// Length of the ID3v2 header, and of its optional footer
pub const ID3V2_HEADER_LEN: usize = 10;

/// Length of an ID3v1 trailer block
pub const ID3V1_TAG_LEN: u64 = 128;

const ID3V2_MAGIC: &[u8; 3] = b"ID3";
const ID3V1_MAGIC: &[u8; 3] = b"TAG";
const FOOTER_PRESENT: u8 = 0x10;

/// Number of bytes to skip to reach the first audio frame
///
/// Returns 0 when `header` is not an ID3v2 header, or when its size field is
/// not a valid synchsafe integer. A broken size is treated as "untagged" so a
/// misparse never throws the scan past real audio.
pub fn skip_tag(header: &[u8]) -> u64 {
    if header.len() < ID3V2_HEADER_LEN || !header.starts_with(ID3V2_MAGIC) {
        return 0;
    }

    let footer_size = if header[5] & FOOTER_PRESENT != 0 {
        ID3V2_HEADER_LEN as u64
    } else {
        0
    };

    match synchsafe_size(&header[6..10]) {
        Some(size) => ID3V2_HEADER_LEN as u64 + u64::from(size) + footer_size,
        None => 0,
    }
}

/// Decode a 4-byte synchsafe integer, `None` if any byte has its high bit set
fn synchsafe_size(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        if b & 0x80 != 0 {
            None
        } else {
            Some((acc << 7) | u32::from(b))
        }
    })
}

/// Check for the "TAG" marker of an ID3v1 trailer
pub fn is_id3v1(bytes: &[u8]) -> bool {
    bytes.starts_with(ID3V1_MAGIC)
}
