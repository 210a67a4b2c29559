//! JSON RPC client for the CRM backend.
//!
//! Every operation is `POST {base}/rpc/{method}` with a JSON argument
//! object. The caller principal travels in `X-Caller-Principal`; the
//! optional service key as a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use estate_crm_core::{AgentStatus, FollowUpId, LeadId, OwnerId, Principal, UserRole};

use super::{BackendError, CrmBackend};
use crate::config::BackendConfig;
use crate::models::{
    AgentRecord, AgentRegistration, FollowUp, FollowUpInput, Lead, LeadInput, Owner, OwnerInput,
    UserProfile,
};

/// Header carrying the caller principal.
pub const CALLER_HEADER: &str = "X-Caller-Principal";

/// HTTP client for the CRM backend.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<SecretString>,
}

/// Error envelope the backend uses for non-2xx answers.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpBackend {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Request` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        // `Url::join` replaces the last segment unless the base ends in '/'
        let mut endpoint = config.url.clone();
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                endpoint,
                api_key: config.api_key.clone(),
            }),
        })
    }

    /// Invoke one backend method.
    #[instrument(skip(self, args), fields(caller = %caller))]
    async fn call<A, R>(
        &self,
        caller: &Principal,
        method: &'static str,
        args: &A,
    ) -> Result<R, BackendError>
    where
        A: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let url = self
            .inner
            .endpoint
            .join(&format!("rpc/{method}"))
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let mut request = self
            .inner
            .client
            .post(url)
            .header(CALLER_HEADER, caller.as_str())
            .json(args);
        if let Some(key) = &self.inner.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "backend responded");

        if status.is_success() {
            return decode_body(&body);
        }

        let message = error_message(&body);
        Err(match status {
            StatusCode::NOT_FOUND => BackendError::NotFound(message),
            StatusCode::CONFLICT => BackendError::AlreadyRegistered,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized,
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                BackendError::Unavailable(message)
            }
            _ => BackendError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }
}

/// Decode a success body. An empty body stands for `null`.
fn decode_body<R: DeserializeOwned>(body: &str) -> Result<R, BackendError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Pull the message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_owned())
}

#[async_trait]
impl CrmBackend for HttpBackend {
    async fn get_caller_user_role(&self, caller: &Principal) -> Result<UserRole, BackendError> {
        self.call(caller, "getCallerUserRole", &json!({})).await
    }

    async fn get_caller_user_profile(
        &self,
        caller: &Principal,
    ) -> Result<Option<UserProfile>, BackendError> {
        self.call(caller, "getCallerUserProfile", &json!({})).await
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Principal,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        self.call(caller, "saveCallerUserProfile", &json!({ "profile": profile }))
            .await
    }

    async fn get_agent_details(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<AgentRecord, BackendError> {
        self.call(caller, "getAgentDetails", &json!({ "agentId": agent }))
            .await
    }

    async fn get_all_agents(&self, caller: &Principal) -> Result<Vec<AgentRecord>, BackendError> {
        self.call(caller, "getAllAgents", &json!({})).await
    }

    async fn register_as_agent(
        &self,
        caller: &Principal,
        registration: &AgentRegistration,
    ) -> Result<(), BackendError> {
        let args = json!({
            "name": registration.name,
            "mobile": registration.mobile,
            "photo": BASE64.encode(&registration.photo),
        });
        self.call(caller, "registerAsAgent", &args).await
    }

    async fn update_agent_status(
        &self,
        caller: &Principal,
        agent: &Principal,
        status: AgentStatus,
    ) -> Result<(), BackendError> {
        self.call(
            caller,
            "updateAgentStatus",
            &json!({ "agentId": agent, "status": status }),
        )
        .await
    }

    async fn get_all_leads(&self, caller: &Principal) -> Result<Vec<Lead>, BackendError> {
        self.call(caller, "getAllLeads", &json!({})).await
    }

    async fn get_agent_leads(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<Lead>, BackendError> {
        self.call(caller, "getAgentLeads", &json!({ "agentId": agent }))
            .await
    }

    async fn get_lead(&self, caller: &Principal, id: LeadId) -> Result<Lead, BackendError> {
        self.call(caller, "getLead", &json!({ "leadId": id })).await
    }

    async fn create_lead(
        &self,
        caller: &Principal,
        input: &LeadInput,
    ) -> Result<LeadId, BackendError> {
        self.call(caller, "createLead", input).await
    }

    async fn update_lead(
        &self,
        caller: &Principal,
        id: LeadId,
        input: &LeadInput,
    ) -> Result<(), BackendError> {
        self.call(caller, "updateLead", &json!({ "leadId": id, "lead": input }))
            .await
    }

    async fn delete_lead(&self, caller: &Principal, id: LeadId) -> Result<(), BackendError> {
        self.call(caller, "deleteLead", &json!({ "leadId": id })).await
    }

    async fn get_all_owners(&self, caller: &Principal) -> Result<Vec<Owner>, BackendError> {
        self.call(caller, "getAllOwners", &json!({})).await
    }

    async fn get_agent_owners(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<Owner>, BackendError> {
        self.call(caller, "getAgentOwners", &json!({ "agentId": agent }))
            .await
    }

    async fn get_owner(&self, caller: &Principal, id: OwnerId) -> Result<Owner, BackendError> {
        self.call(caller, "getOwner", &json!({ "ownerId": id })).await
    }

    async fn create_owner(
        &self,
        caller: &Principal,
        input: &OwnerInput,
    ) -> Result<OwnerId, BackendError> {
        self.call(caller, "createOwner", input).await
    }

    async fn update_owner(
        &self,
        caller: &Principal,
        id: OwnerId,
        input: &OwnerInput,
    ) -> Result<(), BackendError> {
        self.call(
            caller,
            "updateOwner",
            &json!({ "ownerId": id, "owner": input }),
        )
        .await
    }

    async fn delete_owner(&self, caller: &Principal, id: OwnerId) -> Result<(), BackendError> {
        self.call(caller, "deleteOwner", &json!({ "ownerId": id })).await
    }

    async fn get_all_follow_ups(&self, caller: &Principal) -> Result<Vec<FollowUp>, BackendError> {
        self.call(caller, "getAllFollowUps", &json!({})).await
    }

    async fn get_agent_follow_ups(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<FollowUp>, BackendError> {
        self.call(caller, "getAgentFollowUps", &json!({ "agentId": agent }))
            .await
    }

    async fn create_follow_up(
        &self,
        caller: &Principal,
        lead: LeadId,
        input: &FollowUpInput,
    ) -> Result<FollowUpId, BackendError> {
        self.call(
            caller,
            "createFollowUp",
            &json!({ "leadId": lead, "followUp": input }),
        )
        .await
    }

    async fn update_follow_up(
        &self,
        caller: &Principal,
        id: FollowUpId,
        input: &FollowUpInput,
    ) -> Result<(), BackendError> {
        self.call(
            caller,
            "updateFollowUp",
            &json!({ "followUpId": id, "followUp": input }),
        )
        .await
    }

    async fn delete_follow_up(
        &self,
        caller: &Principal,
        id: FollowUpId,
    ) -> Result<(), BackendError> {
        self.call(caller, "deleteFollowUp", &json!({ "followUpId": id }))
            .await
    }
}
