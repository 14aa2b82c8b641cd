use tokio::io::{AsyncRead, AsyncReadExt};

use crate::framebuffer::Framebuffer;
use crate::protocol::Rect;
use crate::VncError;

/// CopyRect encoding: a source coordinate pair, nothing else. The
/// pixels already live in the framebuffer; overlap handling is the
/// framebuffer's job.
#[derive(Debug)]
pub(super) struct CopyRectDecoder {
    pub(super) processed: u64,
}

impl CopyRectDecoder {
    pub(super) fn new() -> Self {
        Self { processed: 0 }
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
        let src_x = input.read_u16().await.map_err(VncError::Read)?;
        let src_y = input.read_u16().await.map_err(VncError::Read)?;

        fb.begin_drawing();
        fb.copy_pixels(src_x, src_y, rect.x, rect.y, rect.width, rect.height);
        fb.end_drawing(*rect);

        self.processed += 1;
        Ok(())
    }
}
