use tokio::io::{AsyncRead, AsyncReadExt};

use super::{fill_solid_rect, read_pixel};
use crate::framebuffer::Framebuffer;
use crate::protocol::Rect;
use crate::VncError;

// Subencoding mask bits. Raw overrides everything else in the mask.
const HEXTILE_RAW: u8 = 0x01;
const HEXTILE_BG_SPECIFIED: u8 = 0x02;
const HEXTILE_FG_SPECIFIED: u8 = 0x04;
const HEXTILE_ANY_SUBRECTS: u8 = 0x08;
const HEXTILE_SUBRECTS_COLORED: u8 = 0x10;

/// Hextile encoding: the rectangle is walked as a row-major grid of
/// 16x16 tiles (edge tiles clipped), each carrying its own
/// subencoding byte.
///
/// The running background and foreground colours persist across tiles
/// within one rectangle. Their value before the first tile specifies
/// them is undefined by the protocol; real servers always specify on
/// the first tile, and this decoder starts from zero.
#[derive(Debug)]
pub(super) struct HextileDecoder {
    pub(super) processed: u64,
    raw_buf: Vec<u8>,
}

impl HextileDecoder {
    pub(super) fn new() -> Self {
        Self {
            processed: 0,
            raw_buf: Vec::new(),
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
        let bpp = fb.pixel_format().bytes_per_pixel;
        let mut tile_bg: u32 = 0;
        let mut sub_fg: u32 = 0;

        fb.begin_drawing();

        let mut tile_y = 0u16;
        while tile_y < rect.height {
            let tile_height = (rect.height - tile_y).min(16);
            let mut tile_x = 0u16;
            while tile_x < rect.width {
                let tile_width = (rect.width - tile_x).min(16);
                let tile_rect = Rect::new(
                    rect.x + tile_x,
                    rect.y + tile_y,
                    tile_width,
                    tile_height,
                );

                let subencoding = input.read_u8().await.map_err(VncError::Read)?;
                if subencoding & HEXTILE_RAW != 0 {
                    self.raw_tile(&tile_rect, bpp, input, fb).await?;
                } else {
                    if subencoding & HEXTILE_BG_SPECIFIED != 0 {
                        tile_bg = read_pixel(input, bpp).await?;
                    }
                    if subencoding & HEXTILE_FG_SPECIFIED != 0 {
                        sub_fg = read_pixel(input, bpp).await?;
                    }
                    let num_subrects = if subencoding & HEXTILE_ANY_SUBRECTS != 0 {
                        input.read_u8().await.map_err(VncError::Read)?
                    } else {
                        0
                    };
                    let subrects_colored = subencoding & HEXTILE_SUBRECTS_COLORED != 0;

                    fill_solid_rect(fb, &tile_rect, tile_bg);

                    for _ in 0..num_subrects {
                        let pixel = if subrects_colored {
                            read_pixel(input, bpp).await?
                        } else {
                            sub_fg
                        };
                        // x/y packed in one byte, (width-1)/(height-1) in the next
                        let xy = input.read_u8().await.map_err(VncError::Read)?;
                        let wh = input.read_u8().await.map_err(VncError::Read)?;
                        let subrect = Rect::new(
                            tile_rect.x + u16::from(xy >> 4),
                            tile_rect.y + u16::from(xy & 0x0F),
                            1 + u16::from(wh >> 4),
                            1 + u16::from(wh & 0x0F),
                        );
                        fill_solid_rect(fb, &subrect, pixel);
                    }
                }

                tile_x += 16;
            }
            tile_y += 16;
        }

        fb.end_drawing(*rect);

        self.processed += 1;
        Ok(())
    }

    async fn raw_tile<S, F>(
        &mut self,
        tile: &Rect,
        bpp: u8,
        input: &mut S,
        fb: &mut F,
    ) -> Result<(), VncError>
    where
        S: AsyncRead + Unpin,
        F: Framebuffer,
    {
        let row_bytes = tile.width as usize * bpp as usize;
        self.raw_buf.resize(row_bytes * tile.height as usize, 0);
        input
            .read_exact(&mut self.raw_buf)
            .await
            .map_err(VncError::Read)?;
        for y in 0..tile.height {
            let row = &self.raw_buf[row_bytes * y as usize..row_bytes * (y as usize + 1)];
            fb.write_pixels(tile.x, tile.y + y, tile.width as usize, row);
        }
        Ok(())
    }
}
