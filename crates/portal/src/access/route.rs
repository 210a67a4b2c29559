//! Logical navigation targets.

use serde::{Serialize, Serializer};

use estate_crm_core::{DenialReason, Principal};

/// A page the portal can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/` - the login surface.
    Login,
    /// `/admin`
    Admin,
    /// `/admin/agent/{id}`
    AdminAgent(Principal),
    /// `/agent`
    Agent,
    /// `/access-denied?reason=...`
    AccessDenied(DenialReason),
}

impl Route {
    /// URL path (and query) of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/".to_owned(),
            Self::Admin => "/admin".to_owned(),
            Self::AdminAgent(id) => format!("/admin/agent/{id}"),
            Self::Agent => "/agent".to_owned(),
            Self::AccessDenied(reason) => format!("/access-denied?reason={reason}"),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Route::Login.path(), "/");
        assert_eq!(Route::Admin.path(), "/admin");
        assert_eq!(Route::Agent.path(), "/agent");
        assert_eq!(
            Route::AdminAgent(Principal::parse("rrkah-fqaaa-aaaaa-aaaaq-cai").unwrap()).path(),
            "/admin/agent/rrkah-fqaaa-aaaaa-aaaaq-cai"
        );
        assert_eq!(
            Route::AccessDenied(DenialReason::NoProfile).path(),
            "/access-denied?reason=no-profile"
        );
    }

    #[test]
    fn test_serializes_as_path() {
        let json = serde_json::to_string(&Route::AccessDenied(DenialReason::Pending)).unwrap();
        assert_eq!(json, "\"/access-denied?reason=pending\"");
    }
}
