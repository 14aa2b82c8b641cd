pub mod encoding;
pub mod messages;
pub mod pixel_format;
pub mod rect;
pub mod security;
pub mod version;

pub use encoding::Encoding;
pub use messages::ClientMsg;
pub use pixel_format::PixelFormat;
pub use rect::{Rect, Screen};
pub use version::VncVersion;

/// Sanity cap on length-prefixed protocol strings.
pub const VNC_STRING_LIMIT: u32 = 1000;
