//! # ferry-sftp
//!
//! SFTP backend for the ferry connection contract:
//! - `transport`: primitive stat/exception transport trait and its `ssh2` adapter
//! - `connection`: `SftpConnection`, the contract implementation
//! - `memory`: in-memory transport (`test-util` feature)

pub mod sftp;
