use crate::VncError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A screen rectangle. (0,0) is the top-left corner of the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reads an `x, y, w, h` quad of big-endian u16s.
    pub(crate) async fn read<S>(reader: &mut S) -> Result<Self, VncError>
    where
        S: AsyncRead + Unpin,
    {
        let x = reader.read_u16().await.map_err(VncError::Read)?;
        let y = reader.read_u16().await.map_err(VncError::Read)?;
        let width = reader.read_u16().await.map_err(VncError::Read)?;
        let height = reader.read_u16().await.map_err(VncError::Read)?;
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// Desktop resolution reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub width: u16,
    pub height: u16,
}

impl Screen {
    /// The rectangle covering the whole desktop.
    pub fn full_rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

impl From<(u16, u16)> for Screen {
    fn from(tuple: (u16, u16)) -> Self {
        Self {
            width: tuple.0,
            height: tuple.1,
        }
    }
}
