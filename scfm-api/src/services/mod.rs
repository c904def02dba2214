//! Workflow services
//!
//! Each operation loads what it needs from the repository, applies the
//! domain rules from scfm-common, writes back and emits an event.

pub mod accounts;
pub mod artists;
pub mod distribution;
pub mod earnings;
pub mod review;
pub mod submission;
pub mod tickets;
