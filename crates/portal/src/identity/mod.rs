//! Identity provider integration.
//!
//! The provider is a black box: it turns an opaque delegation produced by
//! the browser-side login flow into a [`Principal`], and can revoke it
//! again. The portal never looks inside the delegation.

mod http;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, warn};

use estate_crm_core::{LoginMode, Principal, PrincipalError};

pub use http::HttpIdentityProvider;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider rejected the delegation.
    #[error("login rejected: {0}")]
    Rejected(String),

    /// The user cancelled the login flow.
    #[error("login was cancelled")]
    Cancelled,

    /// A session for this principal is already live at the provider.
    #[error("already authenticated as {principal}")]
    AlreadyAuthenticated {
        /// The principal holding the live session.
        principal: Principal,
    },

    /// The provider issued a principal the portal cannot accept.
    #[error("invalid principal: {0}")]
    InvalidPrincipal(#[from] PrincipalError),

    /// HTTP transport failed.
    #[error("identity request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with something unexpected.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// A login attempt from the login surface.
#[derive(Clone)]
pub struct LoginRequest {
    /// Dashboard the user is trying to reach.
    pub mode: LoginMode,
    /// Opaque delegation from the browser-side flow.
    pub delegation: SecretString,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("mode", &self.mode)
            .field("delegation", &"[REDACTED]")
            .finish()
    }
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a delegation for the principal it authenticates.
    async fn login(&self, request: &LoginRequest) -> Result<Principal, IdentityError>;

    /// End the provider-side session for `principal`.
    async fn logout(&self, principal: &Principal) -> Result<(), IdentityError>;
}

/// Log in, recovering once from a stale provider session.
///
/// When the provider reports a live session, that session is logged out and
/// the login is attempted a second time. Any other error is returned as-is.
///
/// # Errors
///
/// Returns the provider's error when login fails, or when the second
/// attempt fails as well.
pub async fn login_with_recovery(
    provider: &dyn IdentityProvider,
    request: &LoginRequest,
) -> Result<Principal, IdentityError> {
    match provider.login(request).await {
        Err(IdentityError::AlreadyAuthenticated { principal }) => {
            warn!(principal = %principal, "Stale identity session, logging out before retry");
            provider.logout(&principal).await?;
            let principal = provider.login(request).await?;
            info!(principal = %principal, "Login succeeded after clearing stale session");
            Ok(principal)
        }
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Provider that replays a scripted list of login outcomes.
    struct Scripted {
        outcomes: Mutex<Vec<Result<Principal, IdentityError>>>,
        logouts: Mutex<Vec<Principal>>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<Principal, IdentityError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                logouts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for Scripted {
        async fn login(&self, _request: &LoginRequest) -> Result<Principal, IdentityError> {
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(IdentityError::Unavailable("exhausted".into())))
        }

        async fn logout(&self, principal: &Principal) -> Result<(), IdentityError> {
            self.logouts.lock().unwrap().push(principal.clone());
            Ok(())
        }
    }

    fn request() -> LoginRequest {
        LoginRequest {
            mode: LoginMode::Agent,
            delegation: SecretString::from("opaque-delegation"),
        }
    }

    fn principal() -> Principal {
        Principal::parse("rrkah-fqaaa-aaaaa-aaaaq-cai").unwrap()
    }

    #[tokio::test]
    async fn test_login_passes_through() {
        let provider = Scripted::new(vec![Ok(principal())]);
        let got = login_with_recovery(&provider, &request()).await.unwrap();
        assert_eq!(got, principal());
        assert!(provider.logouts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_already_authenticated_recovers_once() {
        let provider = Scripted::new(vec![
            Err(IdentityError::AlreadyAuthenticated {
                principal: principal(),
            }),
            Ok(principal()),
        ]);
        let got = login_with_recovery(&provider, &request()).await.unwrap();
        assert_eq!(got, principal());
        assert_eq!(provider.logouts.lock().unwrap().as_slice(), &[principal()]);
    }

    #[tokio::test]
    async fn test_recovery_is_not_repeated() {
        let provider = Scripted::new(vec![
            Err(IdentityError::AlreadyAuthenticated {
                principal: principal(),
            }),
            Err(IdentityError::AlreadyAuthenticated {
                principal: principal(),
            }),
        ]);
        let err = login_with_recovery(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, IdentityError::AlreadyAuthenticated { .. }));
        assert_eq!(provider.logouts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_is_not_recovered() {
        let provider = Scripted::new(vec![Err(IdentityError::Cancelled)]);
        let err = login_with_recovery(&provider, &request()).await.unwrap_err();
        assert!(matches!(err, IdentityError::Cancelled));
        assert!(provider.logouts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_login_request_debug_redacts_delegation() {
        let output = format!("{:?}", request());
        assert!(output.contains("Agent"));
        assert!(!output.contains("opaque-delegation"));
    }
}
