//! # SCF Music Common Library
//!
//! Shared code for the SCF Music distribution service including:
//! - Domain models (releases, artists, tickets, users)
//! - Release validation and status machine
//! - Ticket workflow
//! - Repository port with in-memory and SQLite adapters
//! - Asset storage, event bus, configuration loading

pub mod assets;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod repository;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use repository::Repository;
