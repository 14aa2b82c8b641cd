//! # ookvnc
//!
//! An async client-side implementation of the Remote Framebuffer (RFB)
//! protocol, pinned to RFB 3.3: the wire protocol VNC servers use to
//! stream a desktop to a client while the client forwards keyboard and
//! pointer input back.
//!
//! The crate is the protocol engine only. It draws through the
//! [`Framebuffer`] trait and speaks over any `AsyncRead + AsyncWrite`
//! byte stream, so the window toolkit and the socket are the embedder's
//! business (the bundled `vncviewer` binary supplies both).
//!
//! Six rectangle encodings are decoded: Raw, CopyRect, RRE, CoRRE,
//! Hextile and Zlib-compressed raw.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::net::TcpStream;
//! use ookvnc::{Credentials, Framebuffer, PixelFormat, Rect, VncConnector};
//!
//! struct NullSink;
//!
//! impl Framebuffer for NullSink {
//!     fn pixel_format(&self) -> PixelFormat {
//!         PixelFormat::rgb888()
//!     }
//!     fn begin_drawing(&mut self) {}
//!     fn end_drawing(&mut self, _rect: Rect) {}
//!     fn write_pixels(&mut self, _x: u16, _y: u16, _count: usize, _data: &[u8]) {}
//!     fn write_uniform_pixels(&mut self, _x: u16, _y: u16, _count: usize, _pixel: u32) {}
//!     fn copy_pixels(&mut self, _sx: u16, _sy: u16, _dx: u16, _dy: u16, _w: u16, _h: u16) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tcp = TcpStream::connect("127.0.0.1:5901").await?;
//!     let mut session = VncConnector::new(tcp)
//!         .set_credentials(Credentials::password("secret"))
//!         .allow_shared(true)
//!         .build()
//!         .try_start()
//!         .await?
//!         .finish()?;
//!
//!     let mut sink = NullSink;
//!     session.attach_framebuffer(&sink).await?;
//!
//!     let quit = Arc::new(AtomicBool::new(false));
//!     while !quit.load(Ordering::Relaxed) {
//!         session.process(Duration::from_millis(100), &mut sink).await?;
//!     }
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod events;
pub mod framebuffer;
pub mod protocol;

pub use client::{Credentials, InputSender, SessionState, VncConnector, VncSession, VncState};
pub use codec::DecoderRegistry;
pub use error::VncError;
pub use events::{InputEvent, KeyEvent, PointerEvent};
pub use framebuffer::Framebuffer;
pub use protocol::{Encoding, PixelFormat, Rect, Screen};
