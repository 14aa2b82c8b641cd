use super::{
    auth::{AuthHelper, Credentials},
    connection::{SessionState, VncSession},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, trace};

use crate::codec::DecoderRegistry;
use crate::protocol::messages::read_string_u32;
use crate::protocol::security::{AUTH_FAILED, AUTH_NONE, AUTH_VNC};
use crate::protocol::{PixelFormat, Screen, VncVersion, VNC_STRING_LIMIT};
use crate::VncError;

/// The connection handshake, one state per protocol phase.
///
/// States advance strictly forward; a failed step fails the whole
/// connection, since RFB has no way to back up and retry.
pub enum VncState<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    Greeting(VncConnector<S>),
    Authenticate(VncConnector<S>),
    Initialize(VncConnector<S>),
    Running(VncSession<S>),
}

impl<S> VncState<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Drives the handshake to completion.
    pub async fn try_start(mut self) -> Result<Self, VncError> {
        loop {
            self = match self {
                VncState::Greeting(mut connector) => {
                    let server_version = VncVersion::read(&mut connector.stream).await?;
                    trace!(
                        major = server_version.major,
                        minor = server_version.minor,
                        "server greeting"
                    );
                    // Whatever 3.x the server offers, we pin the session
                    // to 3.3 and use its single-word security handshake.
                    VncVersion::RFB33.write(&mut connector.stream).await?;
                    VncState::Authenticate(connector)
                }
                VncState::Authenticate(mut connector) => {
                    let scheme = connector
                        .stream
                        .read_u32()
                        .await
                        .map_err(VncError::Read)?;
                    match scheme {
                        AUTH_FAILED => {
                            let reason =
                                read_string_u32(&mut connector.stream, VNC_STRING_LIMIT).await?;
                            return Err(VncError::AuthRejected(reason));
                        }
                        AUTH_NONE => {
                            trace!("no authentication required");
                        }
                        AUTH_VNC => {
                            let password =
                                connector.credentials.password.clone().unwrap_or_default();
                            let auth =
                                AuthHelper::read(&mut connector.stream, &password).await?;
                            auth.write(&mut connector.stream).await?;
                            auth.finish(&mut connector.stream).await?;
                            info!("VNC authentication accepted");
                        }
                        other => return Err(VncError::UnknownAuth(other)),
                    }
                    VncState::Initialize(connector)
                }
                VncState::Initialize(mut connector) => {
                    let shared_flag = [u8::from(connector.allow_shared)];
                    connector
                        .stream
                        .write_all(&shared_flag)
                        .await
                        .map_err(VncError::Write)?;

                    let width = connector
                        .stream
                        .read_u16()
                        .await
                        .map_err(VncError::Read)?;
                    let height = connector
                        .stream
                        .read_u16()
                        .await
                        .map_err(VncError::Read)?;
                    let format = PixelFormat::read(&mut connector.stream).await?;
                    let name =
                        read_string_u32(&mut connector.stream, VNC_STRING_LIMIT).await?;
                    info!(desktop = %name, width, height, "connected");

                    VncState::Running(VncSession::new(
                        connector.stream,
                        connector.registry,
                        format,
                        Screen { width, height },
                        name,
                    ))
                }
                VncState::Running(_) => return Ok(self),
            };
        }
    }

    /// The [`SessionState`] this handshake phase corresponds to.
    pub fn state(&self) -> SessionState {
        match self {
            VncState::Greeting(_) => SessionState::Greeting,
            VncState::Authenticate(_) => SessionState::Authenticating,
            VncState::Initialize(_) => SessionState::Initializing,
            VncState::Running(session) => session.state(),
        }
    }

    /// Unwraps the established session.
    pub fn finish(self) -> Result<VncSession<S>, VncError> {
        match self {
            VncState::Running(session) => Ok(session),
            _ => Err(VncError::Connect(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "handshake not completed",
            ))),
        }
    }
}

/// Connection builder for a VNC session over any async byte stream.
pub struct VncConnector<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    stream: S,
    credentials: Credentials,
    allow_shared: bool,
    registry: DecoderRegistry,
}

impl<S> VncConnector<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Starts a configuration over `stream`, usually a freshly
    /// connected `TcpStream`. All decoders are registered by default.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            credentials: Credentials::default(),
            allow_shared: true,
            registry: DecoderRegistry::all(),
        }
    }

    /// Sets the credentials used if the server asks for VNC
    /// authentication.
    pub fn set_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Shared-flag: true leaves other clients connected, false asks the
    /// server for exclusive access.
    pub fn allow_shared(mut self, allow_shared: bool) -> Self {
        self.allow_shared = allow_shared;
        self
    }

    /// Replaces the default decoder set, e.g. after disabling
    /// individual encodings. The registry order is the advertisement
    /// order.
    pub fn set_registry(mut self, registry: DecoderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Completes the configuration.
    pub fn build(self) -> VncState<S> {
        VncState::Greeting(self)
    }
}
