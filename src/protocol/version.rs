use crate::VncError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// RFB protocol versions this client understands.
///
/// Only 3.3 is actually spoken: whatever the server greets with, we
/// reply with 3.3 and use the 3.3 handshake from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VncVersion {
    pub major: u16,
    pub minor: u16,
}

impl VncVersion {
    pub const RFB33: VncVersion = VncVersion { major: 3, minor: 3 };

    /// Reads the server's 12-byte greeting, `"RFB xxx.yyy\n"`.
    ///
    /// A greeting that is not shaped like RFB at all is [`VncError::NotRfb`];
    /// a well-formed greeting with a major version other than 3 is
    /// [`VncError::BadVersion`].
    pub(crate) async fn read<S>(reader: &mut S) -> Result<Self, VncError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buffer = [0_u8; 12];
        reader
            .read_exact(&mut buffer)
            .await
            .map_err(VncError::Read)?;

        if &buffer[..4] != b"RFB " || buffer[7] != b'.' || buffer[11] != b'\n' {
            return Err(VncError::NotRfb);
        }
        let major = parse_triplet(&buffer[4..7]).ok_or(VncError::NotRfb)?;
        let minor = parse_triplet(&buffer[8..11]).ok_or(VncError::NotRfb)?;
        if major != 3 {
            return Err(VncError::BadVersion);
        }
        Ok(VncVersion { major, minor })
    }

    /// Writes this version as a 12-byte greeting.
    pub(crate) async fn write<S>(self, writer: &mut S) -> Result<(), VncError>
    where
        S: AsyncWrite + Unpin,
    {
        let buf = format!("RFB {:03}.{:03}\n", self.major, self.minor);
        writer
            .write_all(buf.as_bytes())
            .await
            .map_err(VncError::Write)?;
        Ok(())
    }
}

fn parse_triplet(digits: &[u8]) -> Option<u16> {
    let mut value = 0u16;
    for &d in digits {
        if !d.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u16::from(d - b'0');
    }
    Some(value)
}
