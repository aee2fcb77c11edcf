//! # ferry-credentials
//!
//! Saved logins for ferry: an ordered list of
//! `{ userName, password, server, protocol }` records persisted as a JSON
//! array, with the password hex-obfuscated at rest.

pub mod credentials;
