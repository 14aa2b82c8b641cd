use crate::VncError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// One true-colour pixel layout.
///
/// The `*_max` fields are the maximum value of each channel (`0xFF` for
/// an 8-bit channel); the `*_shift` fields are the channel positions
/// within the pixel word. Invariant:
/// `bytes_per_pixel * 8 >= depth >= bits(red_max) + bits(green_max) + bits(blue_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub bytes_per_pixel: u8,
    pub depth: u8,
    pub big_endian: bool,
    pub red_max: u16,
    pub green_max: u16,
    pub blue_max: u16,
    pub red_shift: u8,
    pub green_shift: u8,
    pub blue_shift: u8,
}

impl PixelFormat {
    /// 32 bits per pixel, 24-bit depth, little-endian 0RGB word layout.
    ///
    /// The natural choice for a `u32`-per-pixel window buffer on PCs.
    pub fn rgb888() -> Self {
        Self {
            bytes_per_pixel: 4,
            depth: 24,
            big_endian: false,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    /// Reads the 16-byte wire record (as found in ServerInit).
    pub(crate) async fn read<S>(reader: &mut S) -> Result<Self, VncError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 16];
        reader.read_exact(&mut buf).await.map_err(VncError::Read)?;
        Self::from_bytes(&buf)
    }

    pub(crate) fn from_bytes(bytes: &[u8; 16]) -> Result<Self, VncError> {
        let bits_per_pixel = bytes[0];
        if bits_per_pixel == 0 || bits_per_pixel % 8 != 0 || bits_per_pixel > 32 {
            return Err(VncError::BadFormat);
        }
        Ok(Self {
            bytes_per_pixel: bits_per_pixel / 8,
            depth: bytes[1],
            big_endian: bytes[2] != 0,
            // bytes[3] is the true-colour flag; indexed colour is not
            // negotiated by this client so the value is not kept.
            red_max: u16::from_be_bytes([bytes[4], bytes[5]]),
            green_max: u16::from_be_bytes([bytes[6], bytes[7]]),
            blue_max: u16::from_be_bytes([bytes[8], bytes[9]]),
            red_shift: bytes[10],
            green_shift: bytes[11],
            blue_shift: bytes[12],
            // bytes[13..16] are padding
        })
    }

    /// Serializes the 16-byte wire record. The true-colour flag is
    /// always 1: this client never negotiates indexed colour.
    pub(crate) fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0] = self.bytes_per_pixel * 8;
        bytes[1] = self.depth;
        bytes[2] = u8::from(self.big_endian);
        bytes[3] = 1;
        bytes[4..6].copy_from_slice(&self.red_max.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.green_max.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.blue_max.to_be_bytes());
        bytes[10] = self.red_shift;
        bytes[11] = self.green_shift;
        bytes[12] = self.blue_shift;
        bytes
    }

    /// Reconciles the server's native format with the local display's.
    ///
    /// RFB lets a true-colour client dictate the pixel layout, so for 2,
    /// 3 or 4 bytes per pixel the local layout wins. An 8-bit local
    /// display instead adopts the server's channel layout; the
    /// framebuffer owner is expected to compose a matching palette.
    pub fn arbitrate(server: &PixelFormat, local: &PixelFormat) -> PixelFormat {
        if local.bytes_per_pixel == 1 {
            PixelFormat {
                bytes_per_pixel: 1,
                depth: 8,
                big_endian: false,
                ..*server
            }
        } else {
            *local
        }
    }
}
