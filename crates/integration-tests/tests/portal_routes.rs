//! End-to-end tests of the portal router.
//!
//! Requests go through the real router, session layer and extractors via
//! `tower::ServiceExt::oneshot`; the backend and identity provider are the
//! in-memory doubles. The session cookie from login is replayed by hand.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Value, json};
use tower::ServiceExt;

use estate_crm_core::AgentStatus;
use estate_crm_integration_tests::{
    ADMIN, AGENT, MemoryBackend, MemoryIdentity, NEWCOMER, OTHER_AGENT, app_state, lead_input,
    ops, principal,
};
use estate_crm_portal::routes;

struct Portal {
    app: Router,
    backend: Arc<MemoryBackend>,
    identity: Arc<MemoryIdentity>,
}

impl Portal {
    fn new() -> Self {
        let backend = Arc::new(MemoryBackend::seeded());
        let identity = Arc::new(MemoryIdentity::new());
        let app = routes::app(app_state(Arc::clone(&backend), Arc::clone(&identity)), false);
        Self {
            app,
            backend,
            identity,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(Method::GET, uri, cookie, None).await
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.send(Method::POST, uri, cookie, Some(body)).await
    }

    /// Log in as `who` and return the session cookie and the response body.
    async fn login(&self, who: &str, mode: &str) -> (String, Value) {
        let delegation = self.identity.issue(&principal(who));
        let response = self
            .post(
                "/auth/login",
                None,
                json!({ "mode": mode, "delegation": delegation }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        (cookie, json_body(response).await)
    }
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Login surface
// ============================================================================

#[tokio::test]
async fn test_health() {
    let portal = Portal::new();
    let response = portal.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text_body(response).await, "ok");
}

#[tokio::test]
async fn test_home_signed_out() {
    let portal = Portal::new();
    let body = json_body(portal.get("/", None).await).await;

    assert_eq!(body["state"], "unauthenticated");
    assert_eq!(body["mode"], Value::Null);
    assert_eq!(body["navigation"], json!({ "action": "stay-on-login" }));
}

#[tokio::test]
async fn test_agent_login_admitted() {
    let portal = Portal::new();
    let (cookie, body) = portal.login(AGENT, "agent").await;

    assert_eq!(body["state"], "admitted");
    assert_eq!(body["role"], "agent");
    assert_eq!(body["navigation"]["to"], "/agent");

    // Home reflects the same decision for the session
    let home = json_body(portal.get("/", Some(&cookie)).await).await;
    assert_eq!(home["state"], "admitted");
    assert_eq!(home["mode"], "agent");
}

#[tokio::test]
async fn test_login_cancelled() {
    let portal = Portal::new();
    let response = portal
        .post(
            "/auth/login",
            None,
            json!({ "mode": "agent", "delegation": "cancel" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_recovers_stale_identity_session() {
    let portal = Portal::new();
    let stale = principal(OTHER_AGENT);
    portal.identity.leave_stale_session(&stale);

    let (_, body) = portal.login(ADMIN, "admin").await;

    assert_eq!(body["state"], "admitted");
    assert_eq!(portal.identity.logouts(), vec![stale]);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(AGENT, "agent").await;

    let response = portal
        .send(Method::POST, "/auth/logout", Some(&cookie), None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(portal.identity.logouts(), vec![principal(AGENT)]);

    let home = json_body(portal.get("/", Some(&cookie)).await).await;
    assert_eq!(home["state"], "unauthenticated");

    let response = portal.get("/agent", Some(&cookie)).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_load_failure_then_retry() {
    let portal = Portal::new();
    portal.backend.fail(ops::AGENT_DETAILS);

    let (cookie, body) = portal.login(AGENT, "agent").await;
    assert_eq!(body["state"], "account-load-failed");
    assert_eq!(body["failed_reads"], json!(["agent-record"]));
    assert_eq!(body["actions"], json!(["retry", "sign-out"]));
    assert_eq!(body["navigation"], json!({ "action": "stay-on-login" }));

    // A protected route treats the failure as not signed in
    let response = portal.get("/agent", Some(&cookie)).await;
    assert_eq!(location(&response), "/");

    portal.backend.recover(ops::AGENT_DETAILS);
    let response = portal
        .send(Method::POST, "/auth/retry", Some(&cookie), None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["state"], "admitted");
}

#[tokio::test]
async fn test_retry_requires_session() {
    let portal = Portal::new();
    let response = portal.send(Method::POST, "/auth/retry", None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Onboarding
// ============================================================================

#[tokio::test]
async fn test_newcomer_onboarding_through_approval() {
    let portal = Portal::new();
    let (cookie, body) = portal.login(NEWCOMER, "agent").await;
    assert_eq!(body["state"], "needs-profile");
    assert_eq!(body["navigation"], json!({ "action": "show-profile-setup" }));

    let response = portal
        .post("/auth/profile", Some(&cookie), json!({ "name": "Kavya" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["state"], "needs-agent-registration");

    let response = portal
        .post(
            "/auth/agent-registration",
            Some(&cookie),
            json!({
                "name": "Kavya",
                "mobile": "+91 98450 12345",
                "photo": BASE64.encode(b"\x89PNG photo"),
            }),
        )
        .await;
    let body = json_body(response).await;
    assert_eq!(body["state"], "denied");
    assert_eq!(body["reason"], "pending");
    assert_eq!(body["navigation"]["to"], "/access-denied?reason=pending");

    let response = portal.get("/agent", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/access-denied?reason=pending");

    // Admin approves
    let (admin_cookie, _) = portal.login(ADMIN, "admin").await;
    let response = portal
        .send(
            Method::PUT,
            &format!("/admin/agents/{NEWCOMER}/status"),
            Some(&admin_cookie),
            Some(json!({ "status": "active" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        portal.backend.agent_status(&principal(NEWCOMER)),
        Some(AgentStatus::Active)
    );

    let response = portal.get("/agent", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_blank_profile_is_unprocessable() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(NEWCOMER, "agent").await;

    let response = portal
        .post("/auth/profile", Some(&cookie), json!({ "name": "   " }))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(response).await["error"],
        "Please enter your name"
    );
}

#[tokio::test]
async fn test_registration_requires_agent_login() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(NEWCOMER, "admin").await;

    let response = portal
        .post(
            "/auth/agent-registration",
            Some(&cookie),
            json!({ "name": "Kavya", "mobile": "9845012345", "photo": BASE64.encode(b"x") }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(portal.backend.calls(ops::REGISTER), 0);
}

#[tokio::test]
async fn test_registration_bad_photo_encoding() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(NEWCOMER, "agent").await;

    let response = portal
        .post(
            "/auth/agent-registration",
            Some(&cookie),
            json!({ "name": "Kavya", "mobile": "9845012345", "photo": "not base64!" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Guards
// ============================================================================

#[tokio::test]
async fn test_protected_routes_redirect_signed_out() {
    let portal = Portal::new();
    for uri in ["/admin", "/admin/agents", "/agent", "/agent/leads"] {
        let response = portal.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/", "{uri}");
    }
}

#[tokio::test]
async fn test_agent_cannot_reach_admin() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(AGENT, "agent").await;

    let response = portal.get("/admin", Some(&cookie)).await;
    assert_eq!(location(&response), "/access-denied?reason=not-admin");

    let response = portal
        .get("/admin/exports/agent-logins.csv", Some(&cookie))
        .await;
    assert_eq!(location(&response), "/access-denied?reason=not-admin");
}

#[tokio::test]
async fn test_admin_sent_to_admin_dashboard() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(ADMIN, "admin").await;

    let response = portal.get("/agent", Some(&cookie)).await;
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn test_unregistered_user_on_agent_dashboard() {
    let portal = Portal::new();
    portal
        .backend
        .set_profile(&principal(NEWCOMER), "Kavya", estate_crm_core::LoginMode::Agent);
    let (cookie, body) = portal.login(NEWCOMER, "agent").await;
    assert_eq!(body["state"], "needs-agent-registration");

    let response = portal.get("/agent", Some(&cookie)).await;
    assert_eq!(location(&response), "/access-denied?reason=not-agent");
}

#[tokio::test]
async fn test_access_denied_copy() {
    let portal = Portal::new();

    let body = json_body(portal.get("/access-denied?reason=rejected", None).await).await;
    assert_eq!(body["title"], "Access Rejected");
    assert_eq!(body["reason"], "rejected");

    let body = json_body(portal.get("/access-denied?reason=bogus", None).await).await;
    assert_eq!(body["title"], "Access Denied");
    assert_eq!(body["reason"], Value::Null);
}

// ============================================================================
// Dashboards
// ============================================================================

#[tokio::test]
async fn test_agent_lead_is_assigned_to_creator() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(AGENT, "agent").await;

    let input = lead_input("Asha", &principal(OTHER_AGENT));
    let response = portal
        .post(
            "/agent/leads",
            Some(&cookie),
            serde_json::to_value(&input).unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = json_body(response).await["id"].as_u64().unwrap();

    let leads = portal.backend.leads();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].assigned_agent, principal(AGENT));

    let response = portal.get(&format!("/agent/leads/{id}"), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Asha");

    let listed = json_body(portal.get("/agent/leads", Some(&cookie)).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = portal
        .send(
            Method::DELETE,
            &format!("/agent/leads/{id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(portal.backend.leads().is_empty());
}

#[tokio::test]
async fn test_agent_cannot_read_foreign_lead() {
    let portal = Portal::new();
    portal
        .backend
        .set_profile(&principal(OTHER_AGENT), "Meena", estate_crm_core::LoginMode::Agent);
    portal
        .backend
        .set_agent(&principal(OTHER_AGENT), AgentStatus::Active);

    let (other_cookie, _) = portal.login(OTHER_AGENT, "agent").await;
    let response = portal
        .post(
            "/agent/leads",
            Some(&other_cookie),
            serde_json::to_value(lead_input("Asha", &principal(OTHER_AGENT))).unwrap(),
        )
        .await;
    let id = json_body(response).await["id"].as_u64().unwrap();

    let (cookie, _) = portal.login(AGENT, "agent").await;
    let response = portal.get(&format!("/agent/leads/{id}"), Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = portal.get("/agent/leads/999", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_agent_follow_up_lifecycle() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(AGENT, "agent").await;

    let response = portal
        .post(
            "/agent/leads",
            Some(&cookie),
            serde_json::to_value(lead_input("Asha", &principal(AGENT))).unwrap(),
        )
        .await;
    let lead_id = json_body(response).await["id"].as_u64().unwrap();

    let mut follow_up = serde_json::to_value(estate_crm_integration_tests::follow_up_input(
        "site-visit",
    ))
    .unwrap();
    follow_up["leadId"] = json!(lead_id);
    let response = portal
        .post("/agent/follow-ups", Some(&cookie), follow_up.clone())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = json_body(response).await["id"].as_u64().unwrap();

    follow_up["status"] = json!("completed");
    let response = portal
        .send(
            Method::PUT,
            &format!("/agent/follow-ups/{id}"),
            Some(&cookie),
            Some(follow_up),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let overview = json_body(portal.get("/agent", Some(&cookie)).await).await;
    assert_eq!(overview["agent"]["status"], "active");
    assert_eq!(overview["followUps"][0]["status"], "completed");
    assert_eq!(overview["leads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_overview_and_detail() {
    let portal = Portal::new();
    portal
        .backend
        .set_agent(&principal(OTHER_AGENT), AgentStatus::Pending);
    let (cookie, _) = portal.login(ADMIN, "admin").await;

    let overview = json_body(portal.get("/admin", Some(&cookie)).await).await;
    assert_eq!(overview["totalAgents"], 2);
    assert_eq!(overview["pendingAgents"], 1);
    assert_eq!(overview["activeAgents"], 1);

    let detail = json_body(
        portal
            .get(&format!("/admin/agent/{AGENT}"), Some(&cookie))
            .await,
    )
    .await;
    assert_eq!(detail["agent"]["id"], AGENT);

    let response = portal.get("/admin/agent/not-a-principal!", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Exports
// ============================================================================

#[tokio::test]
async fn test_agent_logins_download() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(ADMIN, "admin").await;

    let response = portal
        .get("/admin/exports/agent-logins.csv", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"agent-logins.csv\""
    );

    let body = text_body(response).await;
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("Name,Mobile,Status,Principal ID"));
    assert!(lines.next().unwrap().ends_with(&format!(",active,{AGENT}")));
}

#[tokio::test]
async fn test_empty_report_is_no_content() {
    let portal = Portal::new();
    let (cookie, _) = portal.login(ADMIN, "admin").await;

    let response = portal
        .get("/admin/exports/lead-master-report.xlsx", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_lead_master_download() {
    let portal = Portal::new();
    let (agent_cookie, _) = portal.login(AGENT, "agent").await;
    portal
        .post(
            "/agent/leads",
            Some(&agent_cookie),
            serde_json::to_value(lead_input("Asha", &principal(AGENT))).unwrap(),
        )
        .await;

    let (cookie, _) = portal.login(ADMIN, "admin").await;
    let response = portal
        .get("/admin/exports/lead-master-report.xlsx", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.ms-excel"
    );

    let body = text_body(response).await;
    assert_eq!(body.lines().count(), 2);
    assert!(body.ends_with("2024-03-15\n"));
}
