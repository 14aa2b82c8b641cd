use crate::protocol::{Encoding, PixelFormat, Rect};
use crate::VncError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

// Client -> server message types
const SET_PIXEL_FORMAT: u8 = 0;
const SET_ENCODINGS: u8 = 2;
const FRAMEBUFFER_UPDATE_REQUEST: u8 = 3;
const KEY_EVENT: u8 = 4;
const POINTER_EVENT: u8 = 5;

/// A message travelling from the client to the server.
///
/// Messages are always serialized to a complete frame first and written
/// with a single call, so two senders sharing the transport can never
/// interleave the bytes of distinct messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMsg {
    SetPixelFormat(PixelFormat),
    SetEncodings(Vec<Encoding>),
    FramebufferUpdateRequest { incremental: bool, rect: Rect },
    KeyEvent { keysym: u32, down: bool },
    PointerEvent { x: u16, y: u16, buttons: u8 },
}

impl ClientMsg {
    /// Serializes the complete wire frame, big-endian throughout.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ClientMsg::SetPixelFormat(format) => {
                let mut buf = Vec::with_capacity(20);
                buf.push(SET_PIXEL_FORMAT);
                buf.extend_from_slice(&[0; 3]);
                buf.extend_from_slice(&format.to_bytes());
                buf
            }
            ClientMsg::SetEncodings(encodings) => {
                let mut buf = Vec::with_capacity(4 + encodings.len() * 4);
                buf.push(SET_ENCODINGS);
                buf.push(0);
                buf.extend_from_slice(&(encodings.len() as u16).to_be_bytes());
                for &encoding in encodings {
                    buf.extend_from_slice(&u32::from(encoding).to_be_bytes());
                }
                buf
            }
            ClientMsg::FramebufferUpdateRequest { incremental, rect } => {
                let mut buf = Vec::with_capacity(10);
                buf.push(FRAMEBUFFER_UPDATE_REQUEST);
                buf.push(u8::from(*incremental));
                buf.extend_from_slice(&rect.x.to_be_bytes());
                buf.extend_from_slice(&rect.y.to_be_bytes());
                buf.extend_from_slice(&rect.width.to_be_bytes());
                buf.extend_from_slice(&rect.height.to_be_bytes());
                buf
            }
            ClientMsg::KeyEvent { keysym, down } => {
                let mut buf = Vec::with_capacity(8);
                buf.push(KEY_EVENT);
                buf.push(u8::from(*down));
                buf.extend_from_slice(&[0; 2]);
                buf.extend_from_slice(&keysym.to_be_bytes());
                buf
            }
            ClientMsg::PointerEvent { x, y, buttons } => {
                let mut buf = Vec::with_capacity(6);
                buf.push(POINTER_EVENT);
                buf.push(*buttons);
                buf.extend_from_slice(&x.to_be_bytes());
                buf.extend_from_slice(&y.to_be_bytes());
                buf
            }
        }
    }

    /// Writes the whole frame in one call.
    pub(crate) async fn write<S>(&self, writer: &mut S) -> Result<(), VncError>
    where
        S: AsyncWrite + Unpin,
    {
        writer
            .write_all(&self.to_bytes())
            .await
            .map_err(VncError::Write)?;
        Ok(())
    }
}

/// Reads a `u32`-length-prefixed string, rejecting lengths over `limit`.
///
/// RFB does not specify an encoding for these strings; bytes are
/// converted lossily.
pub(crate) async fn read_string_u32<S>(reader: &mut S, limit: u32) -> Result<String, VncError>
where
    S: AsyncRead + Unpin,
{
    let length = reader.read_u32().await.map_err(VncError::Read)?;
    if length > limit {
        return Err(VncError::OversizedString(length));
    }
    let mut buf = vec![0u8; length as usize];
    reader.read_exact(&mut buf).await.map_err(VncError::Read)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
