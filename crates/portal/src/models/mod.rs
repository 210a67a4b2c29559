//! Domain models for the portal.
//!
//! All entities are owned by the remote CRM backend. The portal holds
//! transient read-through copies only; field names follow the backend's
//! camelCase wire format.

pub mod account;
pub mod follow_up;
pub mod lead;
pub mod owner;
pub mod session;

pub use account::{
    AgentRecord, AgentRegistration, AgentRegistrationForm, MAX_PHOTO_BYTES, RegistrationError,
    UserProfile,
};
pub use follow_up::{FollowUp, FollowUpInput};
pub use lead::{Lead, LeadInput};
pub use owner::{Owner, OwnerInput};
pub use session::{CurrentSession, keys as session_keys};
