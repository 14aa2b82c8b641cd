use flate2::{Decompress, FlushDecompress, Status};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::framebuffer::Framebuffer;
use crate::protocol::Rect;
use crate::VncError;

/// A readable view over a zlib deflate stream delivered in chunks.
///
/// The inflate context lives as long as the owning decoder: the RFB
/// zlib encodings carry one deflate stream per session, so dictionary
/// state must survive from one rectangle to the next. Resetting the
/// context between rectangles corrupts every rectangle after the first.
pub(crate) struct ZlibReader {
    inflate: Decompress,
    input: Vec<u8>,
    consumed: usize,
}

impl std::fmt::Debug for ZlibReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZlibReader")
            .field("input", &self.input)
            .field("consumed", &self.consumed)
            .finish()
    }
}

impl ZlibReader {
    pub(crate) fn new() -> Self {
        Self {
            inflate: Decompress::new(true),
            input: Vec::new(),
            consumed: 0,
        }
    }

    /// Replaces the pending compressed input. Inflate state is kept.
    pub(crate) fn set_stream(&mut self, data: Vec<u8>) {
        self.input = data;
        self.consumed = 0;
    }

    /// Inflates until `out` is full.
    ///
    /// Progress is measured through the context's total counters, and
    /// `StreamEnd` / `BufError` / a stalled `Ok` all terminate with an
    /// error rather than spinning.
    pub(crate) fn read_exact(&mut self, out: &mut [u8]) -> Result<(), VncError> {
        let mut filled = 0;
        while filled < out.len() {
            let in_before = self.inflate.total_in();
            let out_before = self.inflate.total_out();
            let status = self
                .inflate
                .decompress(
                    &self.input[self.consumed..],
                    &mut out[filled..],
                    FlushDecompress::Sync,
                )
                .map_err(|_| VncError::ZlibDecompress)?;
            self.consumed += (self.inflate.total_in() - in_before) as usize;
            let produced = (self.inflate.total_out() - out_before) as usize;
            filled += produced;

            match status {
                Status::Ok => {
                    // No output and no input left means the stream is
                    // short of the advertised pixel count.
                    if produced == 0 && self.consumed >= self.input.len() {
                        return Err(VncError::ZlibDecompress);
                    }
                }
                Status::StreamEnd => {
                    if filled < out.len() {
                        return Err(VncError::ZlibDecompress);
                    }
                }
                Status::BufError => return Err(VncError::ZlibDecompress),
            }
        }
        Ok(())
    }
}

/// Zlib encoding: a compressed-length word, that many deflate bytes,
/// and inside them a Raw-format rectangle.
#[derive(Debug)]
pub(super) struct ZlibRawDecoder {
    pub(super) processed: u64,
    reader: ZlibReader,
    compressed: Vec<u8>,
    pixels: Vec<u8>,
}

impl ZlibRawDecoder {
    pub(super) fn new() -> Self {
        Self {
            processed: 0,
            reader: ZlibReader::new(),
            compressed: Vec::new(),
            pixels: Vec::new(),
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
        let compressed_length = input.read_u32().await.map_err(VncError::Read)?;
        self.compressed.resize(compressed_length as usize, 0);
        input
            .read_exact(&mut self.compressed)
            .await
            .map_err(VncError::Read)?;
        self.reader.set_stream(std::mem::take(&mut self.compressed));

        let bpp = fb.pixel_format().bytes_per_pixel as usize;
        let row_bytes = rect.width as usize * bpp;
        self.pixels.resize(row_bytes * rect.height as usize, 0);
        self.reader.read_exact(&mut self.pixels)?;

        fb.begin_drawing();
        for y in 0..rect.height {
            let row = &self.pixels[row_bytes * y as usize..row_bytes * (y as usize + 1)];
            fb.write_pixels(rect.x, rect.y + y, rect.width as usize, row);
        }
        fb.end_drawing(*rect);

        self.processed += 1;
        Ok(())
    }
}
