//! Account-level entities: profiles and agent records.

use serde::{Deserialize, Serialize};

use estate_crm_core::{AgentStatus, LoginMode, Mobile, MobileError, Principal};

/// Largest accepted agent photo upload.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// A saved user profile.
///
/// Absence of a profile marks a first login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name.
    pub name: String,
    /// Dashboard the user chose when the profile was created.
    pub role: LoginMode,
}

/// The agent-specific registration entity.
///
/// Exists only for principals that completed agent self-registration. The
/// approval `status` is independent of the principal's [`UserRole`].
///
/// [`UserRole`]: estate_crm_core::UserRole
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// The agent's principal.
    pub id: Principal,
    /// Approval status.
    pub status: AgentStatus,
    /// Full name.
    pub name: String,
    /// Mobile number as stored by the backend.
    pub mobile: String,
    /// Direct URL of the uploaded profile photo.
    pub photo_url: String,
}

/// Raw agent registration input, as submitted by the registration form.
#[derive(Clone, Default)]
pub struct AgentRegistrationForm {
    pub name: String,
    pub mobile: String,
    pub photo: Vec<u8>,
}

impl std::fmt::Debug for AgentRegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistrationForm")
            .field("name", &self.name)
            .field("mobile", &self.mobile)
            .field("photo", &format_args!("{} bytes", self.photo.len()))
            .finish()
    }
}

/// Errors found while validating an [`AgentRegistrationForm`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// One of name, mobile or photo is missing.
    #[error("Please fill in all fields and upload a profile photo")]
    MissingField,
    /// The mobile number is malformed.
    #[error("Please enter a valid mobile number")]
    InvalidMobile(#[from] MobileError),
    /// The photo exceeds [`MAX_PHOTO_BYTES`].
    #[error("profile photo must be at most {max} bytes")]
    PhotoTooLarge {
        /// Maximum allowed size.
        max: usize,
    },
}

/// A validated agent registration, ready to send to the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct AgentRegistration {
    pub name: String,
    pub mobile: Mobile,
    pub photo: Vec<u8>,
}

impl std::fmt::Debug for AgentRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistration")
            .field("name", &self.name)
            .field("mobile", &self.mobile)
            .field("photo", &format_args!("{} bytes", self.photo.len()))
            .finish()
    }
}

impl TryFrom<AgentRegistrationForm> for AgentRegistration {
    type Error = RegistrationError;

    fn try_from(form: AgentRegistrationForm) -> Result<Self, Self::Error> {
        let name = form.name.trim();
        if name.is_empty() || form.mobile.trim().is_empty() || form.photo.is_empty() {
            return Err(RegistrationError::MissingField);
        }

        let mobile = Mobile::parse(&form.mobile)?;

        if form.photo.len() > MAX_PHOTO_BYTES {
            return Err(RegistrationError::PhotoTooLarge {
                max: MAX_PHOTO_BYTES,
            });
        }

        Ok(Self {
            name: name.to_owned(),
            mobile,
            photo: form.photo,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, mobile: &str, photo: &[u8]) -> AgentRegistrationForm {
        AgentRegistrationForm {
            name: name.to_owned(),
            mobile: mobile.to_owned(),
            photo: photo.to_vec(),
        }
    }

    #[test]
    fn test_registration_trims_name() {
        let reg = AgentRegistration::try_from(form("  Ravi Kumar ", "+91 98765 43210", b"jpg"))
            .unwrap();
        assert_eq!(reg.name, "Ravi Kumar");
        assert_eq!(reg.mobile.as_str(), "+91 98765 43210");
    }

    #[test]
    fn test_registration_requires_every_field() {
        assert_eq!(
            AgentRegistration::try_from(form(" ", "98765", b"jpg")),
            Err(RegistrationError::MissingField)
        );
        assert_eq!(
            AgentRegistration::try_from(form("Ravi", "", b"jpg")),
            Err(RegistrationError::MissingField)
        );
        assert_eq!(
            AgentRegistration::try_from(form("Ravi", "98765", b"")),
            Err(RegistrationError::MissingField)
        );
    }

    #[test]
    fn test_registration_rejects_bad_mobile() {
        assert!(matches!(
            AgentRegistration::try_from(form("Ravi", "ninety-eight", b"jpg")),
            Err(RegistrationError::InvalidMobile(_))
        ));
    }

    #[test]
    fn test_registration_rejects_oversized_photo() {
        let photo = vec![0_u8; MAX_PHOTO_BYTES + 1];
        assert!(matches!(
            AgentRegistration::try_from(form("Ravi", "98765", &photo)),
            Err(RegistrationError::PhotoTooLarge { .. })
        ));
    }

    #[test]
    fn test_agent_record_wire_format() {
        let json = r#"{
            "id": "rrkah-fqaaa-aaaaa-aaaaq-cai",
            "status": "pending",
            "name": "Ravi",
            "mobile": "98765",
            "photoUrl": "https://blob.example/ravi.jpg"
        }"#;
        let record: AgentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, AgentStatus::Pending);
        assert_eq!(record.id.as_str(), "rrkah-fqaaa-aaaaa-aaaaq-cai");
    }

    #[test]
    fn test_debug_hides_photo_bytes() {
        let debug = format!("{:?}", form("Ravi", "98765", b"secret-bytes"));
        assert!(debug.contains("12 bytes"));
        assert!(!debug.contains("secret"));
    }
}
