//! HTTP client for the identity provider's delegation API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use url::Url;

use estate_crm_core::Principal;

use super::{IdentityError, IdentityProvider, LoginRequest};
use crate::config::IdentityConfig;

const VERIFY_PATH: &str = "api/v1/delegation/verify";
const REVOKE_PATH: &str = "api/v1/delegation/revoke";

/// Identity provider reached over HTTP.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    inner: Arc<Inner>,
}

struct Inner {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    principal: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    principal: Option<String>,
}

impl HttpIdentityProvider {
    /// Create a new identity client.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Request` if the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder().build()?;
        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            inner: Arc::new(Inner { client, base_url }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }
}

/// Map a provider error body onto [`IdentityError`].
fn classify(status: StatusCode, body: &str) -> IdentityError {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    match parsed.code.as_str() {
        "cancelled" | "user_interrupt" => return IdentityError::Cancelled,
        "already_authenticated" => {
            if let Some(principal) = parsed.principal.as_deref() {
                return match Principal::parse(principal) {
                    Ok(principal) => IdentityError::AlreadyAuthenticated { principal },
                    Err(e) => IdentityError::InvalidPrincipal(e),
                };
            }
        }
        _ => {}
    }

    let message = if parsed.message.is_empty() {
        body.trim().to_owned()
    } else {
        parsed.message
    };
    if status.is_client_error() {
        IdentityError::Rejected(message)
    } else {
        IdentityError::Unavailable(format!("{status}: {message}"))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self, request), fields(mode = %request.mode))]
    async fn login(&self, request: &LoginRequest) -> Result<Principal, IdentityError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(VERIFY_PATH)?)
            .json(&json!({ "delegation": request.delegation.expose_secret() }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify(status, &body));
        }

        let verified: VerifyResponse = serde_json::from_str(&body)
            .map_err(|e| IdentityError::Unavailable(format!("malformed response: {e}")))?;
        Ok(Principal::parse(&verified.principal)?)
    }

    #[instrument(skip(self), fields(principal = %principal))]
    async fn logout(&self, principal: &Principal) -> Result<(), IdentityError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(REVOKE_PATH)?)
            .json(&json!({ "principal": principal }))
            .send()
            .await?;

        let status = response.status();
        // Revoking an unknown session is not an error.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await?;
        Err(classify(status, &body))
    }
}
