//! Mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Mobile`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileError {
    /// The input string is empty.
    #[error("mobile number cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("mobile number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that cannot appear in a phone number.
    #[error("mobile number contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input contains punctuation but no digits.
    #[error("mobile number must contain at least one digit")]
    NoDigits,
}

/// A mobile phone number as typed by an agent.
///
/// Formatting is preserved (agents type numbers like `+91 98765-43210` or
/// `(022) 2345 6789`); only the character set is checked.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length after trimming: 1-32 characters
/// - An optional leading `+`, then only digits, spaces, `-`, `(` and `)`
/// - At least one digit
///
/// ## Examples
///
/// ```
/// use estate_crm_core::Mobile;
///
/// assert!(Mobile::parse("+91 98765-43210").is_ok());
/// assert!(Mobile::parse("(022) 2345 6789").is_ok());
///
/// assert!(Mobile::parse("").is_err());
/// assert!(Mobile::parse("call me").is_err());
/// assert!(Mobile::parse("98+76").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Mobile(String);

impl Mobile {
    /// Maximum length of a mobile number.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `Mobile` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input:
    /// - Is empty
    /// - Is longer than 32 characters
    /// - Contains a `+` anywhere but the first position, or any other
    ///   character outside digits, spaces, `-`, `(` and `)`
    /// - Contains no digits
    pub fn parse(s: &str) -> Result<Self, MobileError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MobileError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(MobileError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let rest = s.strip_prefix('+').unwrap_or(s);
        if let Some(c) = rest
            .chars()
            .find(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')')))
        {
            return Err(MobileError::InvalidCharacter(c));
        }

        if !rest.chars().any(|c| c.is_ascii_digit()) {
            return Err(MobileError::NoDigits);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the mobile number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Mobile` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns only the digits, suitable for `wa.me` links.
    #[must_use]
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for Mobile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Mobile {
    type Err = MobileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Mobile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_numbers() {
        assert!(Mobile::parse("9876543210").is_ok());
        assert!(Mobile::parse("+919876543210").is_ok());
        assert!(Mobile::parse("+91 98765 43210").is_ok());
        assert!(Mobile::parse("(022) 2345-6789").is_ok());
    }

    #[test]
    fn test_parse_trims() {
        let mobile = Mobile::parse("  98765 43210 \n").unwrap();
        assert_eq!(mobile.as_str(), "98765 43210");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Mobile::parse("  "), Err(MobileError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "9".repeat(33);
        assert!(matches!(
            Mobile::parse(&long),
            Err(MobileError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_letters_rejected() {
        assert_eq!(
            Mobile::parse("98765x3210"),
            Err(MobileError::InvalidCharacter('x'))
        );
    }

    #[test]
    fn test_parse_inner_plus_rejected() {
        assert_eq!(
            Mobile::parse("91+98765"),
            Err(MobileError::InvalidCharacter('+'))
        );
    }

    #[test]
    fn test_parse_punctuation_only() {
        assert_eq!(Mobile::parse("+( )-"), Err(MobileError::NoDigits));
    }

    #[test]
    fn test_digits() {
        let mobile = Mobile::parse("+91 (987) 654-3210").unwrap();
        assert_eq!(mobile.digits(), "919876543210");
    }
}
