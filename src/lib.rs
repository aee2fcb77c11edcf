//! # ferry
//!
//! Manage files on a remote server over FTP or SFTP through one
//! connection contract.
//!
//! ```no_run
//! use ferry::{ConnectionConfig, ConnectionFactory, Protocol, RemoteConnection};
//!
//! let config = ConnectionConfig::new(Protocol::Sftp, "files.example.com", "ops", "secret");
//! let (mut conn, outcome) = ConnectionFactory::new().open(&config)?;
//! if outcome.is_authenticated() {
//!     let matches = conn.search_files_with_extension("/reports", "csv")?;
//!     println!("{} csv reports", matches);
//!     conn.disconnect()?;
//! }
//! # Ok::<(), ferry::RemoteError>(())
//! ```
//!
//! Crates:
//! - `ferry-core`: the `RemoteConnection` contract, sync and search engines
//! - `ferry-ftp` / `ferry-sftp`: the two backends
//! - `ferry-credentials`: saved logins

pub mod config;
pub mod factory;

pub use config::ConnectionConfig;
pub use factory::ConnectionFactory;

pub use ferry_core::remote::local::{local_directory_exists, rename_local_file};
pub use ferry_core::remote::{
    BatchItem, BatchReport, ConnectOutcome, EntryKind, ItemOutcome, Protocol, RemoteConnection,
    RemoteEntry,
    RemoteError, RemoteErrorKind, RemoteResult, SearchFilter, SessionState, SyncSummary,
};
pub use ferry_credentials::credentials::{CredentialRecord, CredentialStore};
