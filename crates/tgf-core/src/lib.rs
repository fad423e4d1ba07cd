//! Core domain + application logic for the Telegram folder organizer.
//!
//! This crate is intentionally framework-agnostic. The Telegram account, the
//! topic classifier and scratch storage live behind ports (traits) implemented
//! in adapter crates.

pub mod allocator;
pub mod artifacts;
pub mod config;
pub mod domain;
pub mod errors;
pub mod inventory;
pub mod logging;
pub mod partition;
pub mod plan;
pub mod planner;
pub mod ports;
pub mod report;
pub mod security;
pub mod snapshot;

pub use errors::{Error, Result};
