// ── ferry-credentials / credentials module ───────────────────────────────────
//
//   • `store`: load / find / append-if-new over the JSON file
//   • `obfuscation`: reversible hex encoding of stored passwords
//   • `error`: store error type

pub mod error;
pub mod obfuscation;
pub mod store;

pub use error::{StoreError, StoreErrorKind, StoreResult};
pub use obfuscation::{obfuscate, reveal};
pub use store::{CredentialRecord, CredentialStore};
