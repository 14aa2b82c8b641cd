use thiserror::Error;

/// Everything that can go wrong on a VNC connection.
///
/// All errors are fatal to the session: RFB has no resynchronisation
/// points, so nothing is retried. The network context surfaces the error
/// to whoever drives it, which is expected to set the shared quit flag
/// and drop the transport.
#[derive(Error, Debug)]
pub enum VncError {
    /// Host name did not resolve to an address.
    #[error("unable to resolve host: {0}")]
    Resolve(std::io::Error),

    /// TCP connection could not be established.
    #[error("unable to connect: {0}")]
    Connect(std::io::Error),

    /// Reading from the transport failed (including early EOF).
    #[error("unable to read data: {0}")]
    Read(std::io::Error),

    /// Writing to the transport failed.
    #[error("unable to write data: {0}")]
    Write(std::io::Error),

    /// The initial handshake was not an RFB greeting at all.
    #[error("this doesn't appear to be an RFB server")]
    NotRfb,

    /// The server speaks an RFB major version other than 3.
    #[error("incompatible RFB protocol version")]
    BadVersion,

    /// The server requested an authentication scheme we do not implement.
    #[error("unknown authentication type {0} requested")]
    UnknownAuth(u32),

    /// The server refused the connection before authenticating.
    #[error("connection rejected by server: {0}")]
    AuthRejected(String),

    /// The authentication exchange did not succeed.
    #[error("authentication failed")]
    AuthFailed,

    /// The server has stopped accepting authentication attempts.
    #[error("authentication failed too many times")]
    AuthTooMany,

    /// A pixel format we cannot represent.
    #[error("bizarre pixel format")]
    BadFormat,

    /// A server message type outside the RFB 3.3 set.
    #[error("unknown message type {0} received")]
    UnknownMessage(u8),

    /// A rectangle arrived with an encoding we never advertised.
    #[error("no decoder for encoding {0}")]
    MissingDecoder(u32),

    /// A length-prefixed string exceeded the sanity limit.
    #[error("received unreasonably long string ({0} bytes)")]
    OversizedString(u32),

    /// A protocol feature outside this client's negotiated capabilities.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    /// The zlib stream could not be decompressed.
    #[error("unable to decompress data")]
    ZlibDecompress,

    /// A pixel read with a depth the wire format cannot carry.
    #[error("invalid color depth ({0} bytes per pixel)")]
    InvalidColorDepth(u8),
}
