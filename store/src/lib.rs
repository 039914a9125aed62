//! Violation record store for the rights-violation dashboard
//!
//! SQLite persistence for violation records:
//! - Create/replace/delete with taxonomy validation
//! - Sequential `VR-<year>-<seq>` entry numbers
//! - JSON import (ids or display names) and export
//! - [`hrdash_insights::RecordSource`] for dashboard runs

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod db;
pub mod errors;
pub mod transfer;

pub use db::RecordStore;
pub use errors::{Result, StoreError};
