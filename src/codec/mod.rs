use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

mod copy_rect;
mod hextile;
mod raw;
mod rre;
mod zlib;

use crate::framebuffer::Framebuffer;
use crate::protocol::{Encoding, Rect};
use crate::VncError;

use copy_rect::CopyRectDecoder;
use hextile::HextileDecoder;
use raw::RawDecoder;
use rre::{CorreDecoder, RreDecoder};
use zlib::ZlibRawDecoder;

/// The closed set of rectangle decoders.
///
/// Decoders hold per-session state (scratch buffers, the zlib inflate
/// context) and a processed-rectangle counter, so dispatch goes through
/// `&mut self`.
#[derive(Debug)]
enum DecoderKind {
    Raw(RawDecoder),
    CopyRect(CopyRectDecoder),
    Rre(RreDecoder),
    CoRre(CorreDecoder),
    Hextile(HextileDecoder),
    ZlibRaw(ZlibRawDecoder),
}

impl DecoderKind {
    fn new(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Raw => DecoderKind::Raw(RawDecoder::new()),
            Encoding::CopyRect => DecoderKind::CopyRect(CopyRectDecoder::new()),
            Encoding::Rre => DecoderKind::Rre(RreDecoder::new()),
            Encoding::CoRre => DecoderKind::CoRre(CorreDecoder::new()),
            Encoding::Hextile => DecoderKind::Hextile(HextileDecoder::new()),
            Encoding::Zlib => DecoderKind::ZlibRaw(ZlibRawDecoder::new()),
        }
    }

    fn encoding(&self) -> Encoding {
        match self {
            DecoderKind::Raw(_) => Encoding::Raw,
            DecoderKind::CopyRect(_) => Encoding::CopyRect,
            DecoderKind::Rre(_) => Encoding::Rre,
            DecoderKind::CoRre(_) => Encoding::CoRre,
            DecoderKind::Hextile(_) => Encoding::Hextile,
            DecoderKind::ZlibRaw(_) => Encoding::Zlib,
        }
    }

    fn processed(&self) -> u64 {
        match self {
            DecoderKind::Raw(d) => d.processed,
            DecoderKind::CopyRect(d) => d.processed,
            DecoderKind::Rre(d) => d.processed,
            DecoderKind::CoRre(d) => d.processed,
            DecoderKind::Hextile(d) => d.processed,
            DecoderKind::ZlibRaw(d) => d.processed,
        }
    }

    async fn decode<S, F>(&mut self, rect: &Rect, input: &mut S, fb: &mut F) -> Result<(), VncError>
    where
        S: AsyncRead + Unpin,
        F: Framebuffer,
    {
        match self {
            DecoderKind::Raw(d) => d.decode(rect, input, fb).await,
            DecoderKind::CopyRect(d) => d.decode(rect, input, fb).await,
            DecoderKind::Rre(d) => d.decode(rect, input, fb).await,
            DecoderKind::CoRre(d) => d.decode(rect, input, fb).await,
            DecoderKind::Hextile(d) => d.decode(rect, input, fb).await,
            DecoderKind::ZlibRaw(d) => d.decode(rect, input, fb).await,
        }
    }
}

/// The set of decoders a session advertises, in preference order.
///
/// The list order is the order sent on the wire in SetEncodings, and
/// Raw is always present and always last: every conforming server can
/// fall back to it.
#[derive(Debug)]
pub struct DecoderRegistry {
    decoders: Vec<DecoderKind>,
}

impl DecoderRegistry {
    /// All supported decoders, best-compressing first.
    pub fn all() -> Self {
        let order = [
            Encoding::Zlib,
            Encoding::Hextile,
            Encoding::CoRre,
            Encoding::Rre,
            Encoding::CopyRect,
            Encoding::Raw,
        ];
        Self {
            decoders: order.into_iter().map(DecoderKind::new).collect(),
        }
    }

    /// Removes a decoder from the set. Raw cannot be removed.
    pub fn disable(&mut self, encoding: Encoding) {
        if encoding == Encoding::Raw {
            warn!("the Raw decoder is mandatory and cannot be disabled");
            return;
        }
        self.decoders.retain(|d| d.encoding() != encoding);
    }

    /// Encoding ids in advertisement order.
    pub fn encodings(&self) -> Vec<Encoding> {
        self.decoders.iter().map(DecoderKind::encoding).collect()
    }

    /// Per-decoder processed-rectangle counts, for diagnostics.
    pub fn stats(&self) -> Vec<(Encoding, u64)> {
        self.decoders
            .iter()
            .map(|d| (d.encoding(), d.processed()))
            .collect()
    }

    /// Routes one rectangle to the decoder registered for `encoding_id`.
    ///
    /// An unknown id fails the session: the server may only use
    /// encodings we advertised.
    pub(crate) async fn dispatch<S, F>(
        &mut self,
        encoding_id: u32,
        rect: &Rect,
        input: &mut S,
        fb: &mut F,
    ) -> Result<(), VncError>
    where
        S: AsyncRead + Unpin,
        F: Framebuffer,
    {
        let decoder = Encoding::from_id(encoding_id)
            .and_then(|encoding| self.decoders.iter_mut().find(|d| d.encoding() == encoding))
            .ok_or(VncError::MissingDecoder(encoding_id))?;
        decoder.decode(rect, input, fb).await
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::all()
    }
}

/// Reads one pixel off the wire.
///
/// Pixels travel byte-for-byte in the client-declared layout; the bytes
/// are assembled in native order so a framebuffer storing native words
/// reproduces them exactly.
pub(crate) async fn read_pixel<S>(input: &mut S, bpp: u8) -> Result<u32, VncError>
where
    S: AsyncRead + Unpin,
{
    match bpp {
        1 => {
            let val = input.read_u8().await.map_err(VncError::Read)?;
            Ok(u32::from(val))
        }
        2 => {
            let mut buf = [0u8; 2];
            input.read_exact(&mut buf).await.map_err(VncError::Read)?;
            Ok(u32::from(u16::from_ne_bytes(buf)))
        }
        4 => {
            let mut buf = [0u8; 4];
            input.read_exact(&mut buf).await.map_err(VncError::Read)?;
            Ok(u32::from_ne_bytes(buf))
        }
        other => Err(VncError::InvalidColorDepth(other)),
    }
}

/// Fills a rectangle with one pixel value, one row at a time.
pub(crate) fn fill_solid_rect<F: Framebuffer>(fb: &mut F, rect: &Rect, pixel: u32) {
    for y in 0..rect.height {
        fb.write_uniform_pixels(rect.x, rect.y + y, rect.width as usize, pixel);
    }
}
