//! # ferry-ftp
//!
//! FTP backend for the ferry connection contract:
//! - `transport`: primitive reply-code transport trait and its `suppaftp` adapter
//! - `connection`: `FtpConnection`, the contract implementation
//! - `parser`: Unix / Windows / MLSD `LIST` line parsing
//! - `memory`: in-memory transport (`test-util` feature)

pub mod ftp;
