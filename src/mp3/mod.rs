pub mod frame;
pub mod id3;

pub use frame::{has_sync, ChannelMode, FrameHeader, Layer, MpegVersion};
pub use id3::{is_id3v1, skip_tag};
