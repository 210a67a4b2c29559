//! Estate CRM portal library.
//!
//! The portal is the only way into the CRM. It signs users in through the
//! identity provider, decides which dashboard they may reach and proxies
//! their dashboard calls to the remote CRM backend, which owns every record.
//!
//! Exposed as a library so the CLI and the integration tests can drive the
//! resolver, the exports and the router without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod backend;
pub mod config;
pub mod error;
pub mod exports;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
