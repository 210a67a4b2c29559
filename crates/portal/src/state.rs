//! Application state shared across handlers.

use std::sync::Arc;

use crate::access::{AccessResolver, AccountCache};
use crate::backend::CrmBackend;
use crate::config::CacheConfig;
use crate::identity::IdentityProvider;

/// Application state shared across all handlers.
///
/// Cheaply cloneable; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    backend: Arc<dyn CrmBackend>,
    identity: Arc<dyn IdentityProvider>,
    resolver: AccessResolver,
}

impl AppState {
    /// Build the state around a backend and identity provider.
    #[must_use]
    pub fn new(
        backend: Arc<dyn CrmBackend>,
        identity: Arc<dyn IdentityProvider>,
        cache: &CacheConfig,
    ) -> Self {
        let resolver = AccessResolver::new(Arc::clone(&backend), AccountCache::new(cache));
        Self {
            inner: Arc::new(AppStateInner {
                backend,
                identity,
                resolver,
            }),
        }
    }

    /// Get the CRM backend.
    #[must_use]
    pub fn backend(&self) -> &dyn CrmBackend {
        self.inner.backend.as_ref()
    }

    /// Get the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get the access resolver.
    #[must_use]
    pub fn resolver(&self) -> &AccessResolver {
        &self.inner.resolver
    }
}
