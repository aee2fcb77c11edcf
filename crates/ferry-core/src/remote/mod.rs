// ── ferry-core / remote module ───────────────────────────────────────────────
//
// Everything that does not depend on a wire protocol:
//   • `connection`: the `RemoteConnection` contract
//   • `types` / `error`: shared value types and the contract error
//   • `path`: `/`-separated remote path helpers
//   • `batch`: multi-file transfers with per-item reports
//   • `search`: keyword / extension counts over one listing
//   • `sync`: recursive download, upload and staged copy
//   • `local`: local-filesystem helpers
//   • `memory`: in-memory remote tree (tests / `test-util` only)

pub mod types;
pub mod error;
pub mod path;
pub mod connection;
pub mod batch;
pub mod search;
pub mod sync;
pub mod local;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use connection::RemoteConnection;
pub use error::{RemoteError, RemoteErrorKind, RemoteResult};
pub use search::SearchFilter;
pub use sync::StagingArea;
pub use types::*;
