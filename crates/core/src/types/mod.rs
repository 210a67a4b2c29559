//! Core types for Estate CRM.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod access;
pub mod id;
pub mod mobile;
pub mod principal;
pub mod status;
pub mod timestamp;

pub use access::{DenialReason, LoginMode};
pub use id::*;
pub use mobile::{Mobile, MobileError};
pub use principal::{Principal, PrincipalError};
pub use status::*;
pub use timestamp::Timestamp;
