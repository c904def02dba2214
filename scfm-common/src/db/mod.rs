//! Database initialization for the SQLite adapter

pub mod init;

pub use init::*;
