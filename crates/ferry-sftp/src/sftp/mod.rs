// ── ferry-sftp / sftp module ─────────────────────────────────────────────────
//
// Adapts an attribute-driven SFTP channel to `RemoteConnection`:
//   • existence probes via `stat`, not-found mapped to `false`
//   • file / directory distinction from the attribute type bits
//   • octal permission changes through `setstat`
//   • no server-side cwd: the login directory is resolved once at connect

pub mod types;
pub mod error;
pub mod transport;
pub mod connection;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use connection::SftpConnection;
pub use error::{SftpError, SftpErrorKind, SftpResult};
pub use transport::{SftpDialer, SftpTransport, Ssh2Dialer, Ssh2Transport};
pub use types::{SftpAttributes, SftpSettings};
