// ── ferry-ftp / ftp module ───────────────────────────────────────────────────
//
// Adapts a stateful, reply-code-driven session to `RemoteConnection`:
//   • existence probes by CWD + restore (no STAT primitive)
//   • LIST text parsed into `RemoteEntry` values
//   • binary TYPE and passive mode set once after login
//   • no permission model: `change_permission` reports `Unsupported`

pub mod types;
pub mod error;
pub mod parser;
pub mod transport;
pub mod connection;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use connection::FtpConnection;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use transport::{FtpDialer, FtpTransport, SuppaFtpDialer, SuppaFtpTransport};
pub use types::FtpSettings;
