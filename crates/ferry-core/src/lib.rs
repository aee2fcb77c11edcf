//! # ferry-core
//!
//! Protocol-neutral half of ferry:
//!   • The `RemoteConnection` contract every backend implements
//!   • Shared value types (entries, outcomes, batch reports)
//!   • Directory sync engine (download / upload / copy through a staging area)
//!   • Keyword / extension search
//!   • In-memory remote tree for transport doubles (`test-util` feature)

pub mod remote;
