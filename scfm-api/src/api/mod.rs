//! HTTP handlers for scfm-api
//!
//! Handlers stay thin: extract, call into `crate::services`, wrap the result.

pub mod admin;
pub mod artists;
pub mod assets;
pub mod auth;
pub mod catalog;
pub mod drafts;
pub mod earnings;
pub mod health;
pub mod releases;
pub mod sse;
pub mod tickets;

pub use auth::CurrentUser;
pub use health::health_routes;
