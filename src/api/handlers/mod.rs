//! API handlers for Passnote.
//!
//! `auth` owns sign-in, sessions and the session gate; `notes` is the
//! persona-scoped resource behind that gate.

pub mod auth;
pub mod health;
pub mod notes;
pub mod root;
