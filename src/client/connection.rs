use std::sync::Arc;
use std::time::Duration;

use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::codec::DecoderRegistry;
use crate::events::InputEvent;
use crate::framebuffer::Framebuffer;
use crate::protocol::{ClientMsg, Encoding, PixelFormat, Rect, Screen};
use crate::VncError;

// Server -> client message types
const SERVER_FRAMEBUFFER_UPDATE: u8 = 0;
const SERVER_SET_COLOR_MAP_ENTRIES: u8 = 1;
const SERVER_BELL: u8 = 2;
const SERVER_CUT_TEXT: u8 = 3;

/// Lifecycle of a connection, advanced strictly forward.
///
/// The first three states are driven by the connector during the
/// handshake; an established [`VncSession`] starts at `Initializing`
/// and reaches `Running` once a framebuffer is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Greeting,
    Authenticating,
    Initializing,
    Running,
    Closed,
}

/// An established VNC session: the server message loop and the
/// client-to-server message surface.
///
/// The transport is split: the session exclusively owns the read half
/// (one receiver by construction), while the write half sits behind a
/// lock shared with every [`InputSender`], so acknowledgements and
/// forwarded input never interleave on the wire.
#[derive(Debug)]
pub struct VncSession<S> {
    reader: ReadHalf<S>,
    writer: Arc<Mutex<WriteHalf<S>>>,
    registry: DecoderRegistry,
    format: PixelFormat,
    screen: Screen,
    desktop_name: String,
    state: SessionState,
}

impl<S> VncSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(
        stream: S,
        registry: DecoderRegistry,
        server_format: PixelFormat,
        screen: Screen,
        desktop_name: String,
    ) -> Self {
        let (reader, writer) = split(stream);
        Self {
            reader,
            writer: Arc::new(Mutex::new(writer)),
            registry,
            format: server_format,
            screen,
            desktop_name,
            state: SessionState::Initializing,
        }
    }

    pub fn desktop_name(&self) -> &str {
        &self.desktop_name
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The session pixel format: the server's native format until a
    /// framebuffer is attached, the arbitrated format afterwards.
    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Per-decoder processed-rectangle counts, for diagnostics.
    pub fn decoder_stats(&self) -> Vec<(Encoding, u64)> {
        self.registry.stats()
    }

    /// A handle for forwarding input from another task. Cloneable; all
    /// clones share the session's send lock.
    pub fn input_sender(&self) -> InputSender<S> {
        InputSender {
            writer: Arc::clone(&self.writer),
            screen: self.screen,
        }
    }

    /// Adopts the framebuffer's preferred pixel format and tells the
    /// server about it, advertises our encodings, and requests the
    /// first full-desktop update.
    ///
    /// Must be called exactly once, before the first
    /// [`process`](Self::process) call.
    pub async fn attach_framebuffer<F>(&mut self, fb: &F) -> Result<(), VncError>
    where
        F: Framebuffer,
    {
        assert!(
            self.state == SessionState::Initializing,
            "attach_framebuffer may only be called once, on a fresh session"
        );
        self.format = PixelFormat::arbitrate(&self.format, &fb.pixel_format());
        debug!(format = ?self.format, "pixel format arbitrated");

        let mut writer = self.writer.lock().await;
        ClientMsg::SetPixelFormat(self.format)
            .write(&mut *writer)
            .await?;
        ClientMsg::SetEncodings(self.registry.encodings())
            .write(&mut *writer)
            .await?;
        ClientMsg::FramebufferUpdateRequest {
            incremental: false,
            rect: self.screen.full_rect(),
        }
        .write(&mut *writer)
        .await?;
        drop(writer);

        self.state = SessionState::Running;
        Ok(())
    }

    /// One tick of the server message loop.
    ///
    /// Waits up to `timeout` for the first byte of a message; returns
    /// `Ok(false)` if none arrived, so the caller can check its quit
    /// flag and re-enter. Once a message header is in, the whole
    /// message is consumed before returning `Ok(true)`.
    pub async fn process<F>(&mut self, timeout: Duration, fb: &mut F) -> Result<bool, VncError>
    where
        F: Framebuffer,
    {
        if self.state != SessionState::Running {
            return Ok(false);
        }

        let msg_type = match tokio::time::timeout(timeout, self.reader.read_u8()).await {
            Err(_) => return Ok(false),
            Ok(result) => result.map_err(VncError::Read)?,
        };

        match msg_type {
            SERVER_FRAMEBUFFER_UPDATE => {
                self.handle_framebuffer_update(fb).await?;
            }
            SERVER_SET_COLOR_MAP_ENTRIES => {
                // We always negotiate true colour, so a colour map is a
                // server bug from our point of view.
                return Err(VncError::UnsupportedFeature("SetColorMapEntries"));
            }
            SERVER_BELL => {
                trace!("bell");
                fb.bell();
            }
            SERVER_CUT_TEXT => {
                self.drain_cut_text().await?;
            }
            other => return Err(VncError::UnknownMessage(other)),
        }
        Ok(true)
    }

    async fn handle_framebuffer_update<F>(&mut self, fb: &mut F) -> Result<(), VncError>
    where
        F: Framebuffer,
    {
        let _padding = self.reader.read_u8().await.map_err(VncError::Read)?;
        let num_rects = self.reader.read_u16().await.map_err(VncError::Read)?;
        trace!(num_rects, "framebuffer update");

        for _ in 0..num_rects {
            let rect = Rect::read(&mut self.reader).await?;
            let encoding_id = self.reader.read_u32().await.map_err(VncError::Read)?;
            trace!(?rect, encoding_id, "rectangle");
            self.registry
                .dispatch(encoding_id, &rect, &mut self.reader, fb)
                .await?;
        }

        // Keep the pipe primed with the next incremental request.
        self.send(&ClientMsg::FramebufferUpdateRequest {
            incremental: true,
            rect: self.screen.full_rect(),
        })
        .await
    }

    /// Cut text is advertised-length data we do not use; drain it in
    /// bounded chunks since the length word is server-controlled.
    async fn drain_cut_text(&mut self) -> Result<(), VncError> {
        let mut padding = [0u8; 3];
        self.reader
            .read_exact(&mut padding)
            .await
            .map_err(VncError::Read)?;
        let length = self.reader.read_u32().await.map_err(VncError::Read)?;
        let mut remaining = length as usize;
        let mut chunk = [0u8; 4096];
        while remaining > 0 {
            let take = remaining.min(chunk.len());
            self.reader
                .read_exact(&mut chunk[..take])
                .await
                .map_err(VncError::Read)?;
            remaining -= take;
        }
        debug!(length, "discarded server cut text");
        Ok(())
    }

    async fn send(&self, msg: &ClientMsg) -> Result<(), VncError> {
        let mut writer = self.writer.lock().await;
        msg.write(&mut *writer).await
    }

    /// Shuts the transport down. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), VncError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        let mut writer = self.writer.lock().await;
        writer.shutdown().await.map_err(VncError::Write)?;
        Ok(())
    }
}

/// Input-forwarding handle held by the UI context.
///
/// Writes client messages through the session's send lock, one
/// complete frame per message.
pub struct InputSender<S> {
    writer: Arc<Mutex<WriteHalf<S>>>,
    screen: Screen,
}

impl<S> Clone for InputSender<S> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            screen: self.screen,
        }
    }
}

impl<S> InputSender<S>
where
    S: AsyncWrite,
{
    pub async fn send(&self, event: InputEvent) -> Result<(), VncError> {
        let msg = match event {
            InputEvent::Key(key) => ClientMsg::KeyEvent {
                keysym: key.keysym,
                down: key.down,
            },
            InputEvent::Pointer(pointer) => ClientMsg::PointerEvent {
                x: pointer.x,
                y: pointer.y,
                buttons: pointer.buttons,
            },
            InputEvent::Refresh => ClientMsg::FramebufferUpdateRequest {
                incremental: true,
                rect: self.screen.full_rect(),
            },
        };
        let mut writer = self.writer.lock().await;
        msg.write(&mut *writer).await
    }

    pub async fn key_event(&self, keysym: u32, down: bool) -> Result<(), VncError> {
        self.send(InputEvent::Key(crate::events::KeyEvent { keysym, down }))
            .await
    }

    pub async fn pointer_event(&self, x: u16, y: u16, buttons: u8) -> Result<(), VncError> {
        self.send(InputEvent::Pointer(crate::events::PointerEvent {
            x,
            y,
            buttons,
        }))
        .await
    }

    /// Asks the server for an incremental refresh of the whole desktop.
    pub async fn refresh(&self) -> Result<(), VncError> {
        self.send(InputEvent::Refresh).await
    }
}
