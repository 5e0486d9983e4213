/// Protocol constants and header layout.
///
/// Header:
///   [ver: u8][frame_type: u8][flags: u16][body_len: u32 BE]
/// Body:
///   UTF-8 JSON, up to `MAX_BODY_LEN` (or the configured `max_frame_len`).
pub const PROTO_VERSION: u8 = 1;

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 8;

/// Maximum allowed body size for a frame (to avoid OOM).
pub const MAX_BODY_LEN: usize = 1_048_576; // 1 MiB
