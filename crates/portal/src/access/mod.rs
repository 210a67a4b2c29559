//! Post-login access resolution.
//!
//! After the identity provider hands back a principal, the portal still has
//! to find out whether that user has a profile, what role they hold and,
//! on the agent path, whether their registration was approved. This module
//! answers that question.
//!
//! - [`decide`] - the pure decision over settled reads
//! - [`AccessResolver`] - loads the reads and performs the profile and
//!   registration side effects
//! - [`AccountCache`] - per-principal cache with explicit invalidation
//! - [`guard`] - maps a decision onto the protected dashboards

mod cache;
mod decision;
mod guard;
mod resolver;
mod route;

use thiserror::Error;

pub use cache::{AccountCache, CacheKey, CacheValue, QueryKind, ReadTicket};
pub use decision::{
    AccessState, AccountSnapshot, AdmittedRole, LOAD_FAILED_MESSAGE, Navigation, ReadState,
    RecoveryAction, decide,
};
pub use guard::{GuardOutcome, ProtectedArea, guard};
pub use resolver::AccessResolver;
pub use route::Route;

use crate::backend::BackendError;
use crate::models::RegistrationError;

/// Errors from the resolver's mutating operations.
///
/// None of these change the access state; the user may resubmit.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Submitted input failed validation.
    #[error("{0}")]
    InvalidInput(&'static str),

    /// The registration form failed validation.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The operation does not apply in the current state.
    #[error("not allowed while {0}")]
    UnexpectedState(&'static str),

    /// The backend already holds an agent record for the caller.
    #[error("You have already registered as an agent")]
    AlreadyRegistered,

    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
