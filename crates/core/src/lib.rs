//! Estate CRM Core - Shared types library.
//!
//! This crate provides common types used across all Estate CRM components:
//! - `portal` - Role-gated web portal for admins and field agents
//! - `cli` - Command-line tools for access checks and exports
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The portal
//! and the CLI both speak to the remote CRM backend; the types here are the
//! vocabulary they share.
//!
//! # Modules
//!
//! - [`types`] - Principals, ids, mobile numbers, roles and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
