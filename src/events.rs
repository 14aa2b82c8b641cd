/// A key press or release, in X11 keysym space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub keysym: u32,
    pub down: bool,
}

/// Pointer position plus the current button mask.
///
/// Mask bits follow RFB: bit 0 is the left button, bit 1 middle,
/// bit 2 right, bits 3/4 the scroll wheel up/down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: u16,
    pub y: u16,
    pub buttons: u8,
}

/// Input-side events the embedder forwards to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Pointer(PointerEvent),
    /// Ask the server for an incremental refresh of the whole desktop.
    Refresh,
}
