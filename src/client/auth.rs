use crate::protocol::security::{challenge_response, check_auth_result};
use crate::VncError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Credentials for VNC authentication.
///
/// Classic VNC authentication only knows a password. A missing password
/// is treated as the empty password if the server insists on
/// authenticating anyway.
#[derive(Debug, Default, Clone)]
pub struct Credentials {
    pub password: Option<String>,
}

impl Credentials {
    /// No authentication material.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }
}

/// Drives one DES challenge-response exchange.
pub(super) struct AuthHelper {
    response: [u8; 16],
}

impl AuthHelper {
    /// Reads the 16-byte challenge and prepares the response.
    pub(super) async fn read<S>(reader: &mut S, password: &str) -> Result<Self, VncError>
    where
        S: AsyncRead + Unpin,
    {
        let mut challenge = [0u8; 16];
        reader
            .read_exact(&mut challenge)
            .await
            .map_err(VncError::Read)?;
        Ok(Self {
            response: challenge_response(password, &challenge),
        })
    }

    pub(super) async fn write<S>(&self, writer: &mut S) -> Result<(), VncError>
    where
        S: AsyncWrite + Unpin,
    {
        writer
            .write_all(&self.response)
            .await
            .map_err(VncError::Write)?;
        Ok(())
    }

    /// Reads the SecurityResult word and maps it to success or failure.
    pub(super) async fn finish<S>(self, reader: &mut S) -> Result<(), VncError>
    where
        S: AsyncRead + Unpin,
    {
        let result = reader.read_u32().await.map_err(VncError::Read)?;
        check_auth_result(result)
    }
}
