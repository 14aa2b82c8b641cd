pub mod auth;
pub mod connection;
pub mod connector;

pub use auth::Credentials;
pub use connection::{InputSender, SessionState, VncSession};
pub use connector::{VncConnector, VncState};
