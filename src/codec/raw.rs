use tokio::io::{AsyncRead, AsyncReadExt};

use crate::framebuffer::Framebuffer;
use crate::protocol::Rect;
use crate::VncError;

/// Raw encoding: `width * height * bytes_per_pixel` bytes, verbatim.
///
/// Mandatory for every client; always advertised.
#[derive(Debug)]
pub(super) struct RawDecoder {
    pub(super) processed: u64,
    buf: Vec<u8>,
}

impl RawDecoder {
    pub(super) fn new() -> Self {
        Self {
            processed: 0,
            buf: Vec::new(),
        }
    }

    pub(super) async fn decode<S, F>(
        &mut self,
        rect: &Rect,
        input: &mut S,
        fb: &mut F,
    ) -> Result<(), VncError>
    where
        S: AsyncRead + Unpin,
        F: Framebuffer,
    {
        let bpp = fb.pixel_format().bytes_per_pixel as usize;
        let row_bytes = rect.width as usize * bpp;
        self.buf.resize(row_bytes * rect.height as usize, 0);
        input
            .read_exact(&mut self.buf)
            .await
            .map_err(VncError::Read)?;

        fb.begin_drawing();
        // One call per row; the framebuffer may not store rows contiguously.
        for y in 0..rect.height {
            let row = &self.buf[row_bytes * y as usize..row_bytes * (y as usize + 1)];
            fb.write_pixels(rect.x, rect.y + y, rect.width as usize, row);
        }
        fb.end_drawing(*rect);

        self.processed += 1;
        Ok(())
    }
}
