//! Principal type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Principal`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    /// The input string is empty.
    #[error("principal cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("principal must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the textual principal alphabet.
    #[error("principal contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input is the anonymous principal.
    #[error("the anonymous principal cannot hold a session")]
    Anonymous,
}

/// An opaque per-user identity handle issued by the identity provider.
///
/// Stored in its textual form (groups of lowercase base32 separated by
/// dashes, e.g. `rrkah-fqaaa-aaaaa-aaaaq-cai`). The portal never inspects
/// its structure beyond the character set.
///
/// ## Constraints
///
/// - Length: 1-63 characters
/// - ASCII alphanumerics and `-` only
/// - Not the anonymous principal (`2vxsx-fae`)
///
/// ## Examples
///
/// ```
/// use estate_crm_core::Principal;
///
/// assert!(Principal::parse("rrkah-fqaaa-aaaaa-aaaaq-cai").is_ok());
/// assert!(Principal::parse("").is_err());
/// assert!(Principal::parse("2vxsx-fae").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Maximum length of a textual principal.
    pub const MAX_LENGTH: usize = 63;

    /// Textual form of the anonymous principal.
    pub const ANONYMOUS: &'static str = "2vxsx-fae";

    /// Parse a `Principal` from its textual form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is longer than 63 characters
    /// - Contains anything but ASCII alphanumerics and `-`
    /// - Is the anonymous principal
    pub fn parse(s: &str) -> Result<Self, PrincipalError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PrincipalError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(PrincipalError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(PrincipalError::InvalidCharacter(c));
        }

        let normalized = s.to_ascii_lowercase();
        if normalized == Self::ANONYMOUS {
            return Err(PrincipalError::Anonymous);
        }

        Ok(Self(normalized))
    }

    /// Returns the principal as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Principal` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
