use tokio::io::{AsyncRead, AsyncReadExt};

use super::{fill_solid_rect, read_pixel};
use crate::framebuffer::Framebuffer;
use crate::protocol::Rect;
use crate::VncError;

/// RRE encoding: a background fill plus a list of solid subrectangles
/// with 16-bit geometry.
#[derive(Debug)]
pub(super) struct RreDecoder {
    pub(super) processed: u64,
}

impl RreDecoder {
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
        let bpp = fb.pixel_format().bytes_per_pixel;
        let num_subrects = input.read_u32().await.map_err(VncError::Read)?;
        let bg_pixel = read_pixel(input, bpp).await?;

        fb.begin_drawing();
        fill_solid_rect(fb, rect, bg_pixel);
        for _ in 0..num_subrects {
            let pixel = read_pixel(input, bpp).await?;
            let x = input.read_u16().await.map_err(VncError::Read)?;
            let y = input.read_u16().await.map_err(VncError::Read)?;
            let w = input.read_u16().await.map_err(VncError::Read)?;
            let h = input.read_u16().await.map_err(VncError::Read)?;
            let subrect = Rect::new(rect.x + x, rect.y + y, w, h);
            fill_solid_rect(fb, &subrect, pixel);
        }
        fb.end_drawing(*rect);

        self.processed += 1;
        Ok(())
    }
}

/// CoRRE encoding: identical to RRE except the subrectangle geometry is
/// 8-bit, so servers only use it for rectangles up to 255x255.
#[derive(Debug)]
pub(super) struct CorreDecoder {
    pub(super) processed: u64,
}

impl CorreDecoder {
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
        let bpp = fb.pixel_format().bytes_per_pixel;
        let num_subrects = input.read_u32().await.map_err(VncError::Read)?;
        let bg_pixel = read_pixel(input, bpp).await?;

        fb.begin_drawing();
        fill_solid_rect(fb, rect, bg_pixel);
        for _ in 0..num_subrects {
            let pixel = read_pixel(input, bpp).await?;
            let x = input.read_u8().await.map_err(VncError::Read)?;
            let y = input.read_u8().await.map_err(VncError::Read)?;
            let w = input.read_u8().await.map_err(VncError::Read)?;
            let h = input.read_u8().await.map_err(VncError::Read)?;
            let subrect = Rect::new(
                rect.x + u16::from(x),
                rect.y + u16::from(y),
                u16::from(w),
                u16::from(h),
            );
            fill_solid_rect(fb, &subrect, pixel);
        }
        fb.end_drawing(*rect);

        self.processed += 1;
        Ok(())
    }
}
