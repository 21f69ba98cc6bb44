//! Access-token renewal
//!
//! The refresh coordinator exchanges the long-lived refresh token for a
//! new access token via `POST /refresh`. Renewal is single-flight: an
//! async mutex serializes callers, and a caller that was queued behind a
//! completed refresh reuses its result instead of issuing a second
//! network exchange. Only one refresh request is ever outstanding.

use std::sync::Arc;

use crate::error::Result;
use crate::session::SessionStore;
use crate::transport::{RequestDescriptor, Transport};
use crate::types::RefreshResponse;

/// Exchanges the refresh token for new access tokens
pub struct RefreshCoordinator {
    transport: Arc<Transport>,
    session: Arc<SessionStore>,
    inflight: tokio::sync::Mutex<()>,
}

impl RefreshCoordinator {
    /// Create a coordinator over the shared transport and session.
    pub fn new(transport: Arc<Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            transport,
            session,
            inflight: tokio::sync::Mutex::new(()),
        }
    }

    /// Renew the access token that `stale_token` failed with.
    ///
    /// Returns the token to retry with. If another caller already renewed
    /// while this one was waiting (the stored token no longer equals
    /// `stale_token`), that token is returned without a network exchange.
    /// Fails with the transport's auth error when the refresh token itself
    /// is rejected.
    pub async fn refresh(&self, stale_token: &str) -> Result<String> {
        let _guard = self.inflight.lock().await;

        if let Some(current) = self.session.access_token()
            && current != stale_token
        {
            tracing::debug!("coalescing onto already-renewed access token");
            return Ok(current);
        }

        let refresh_token = self.session.refresh_token().unwrap_or_default();
        let descriptor = RequestDescriptor::post("/refresh");
        let response = self
            .transport
            .send(&descriptor, Some(&refresh_token))
            .await?;
        let parsed: RefreshResponse = response.parse()?;

        self.session.set_access_token(&parsed.access_token)?;
        tracing::info!("access token renewed");
        Ok(parsed.access_token)
    }
}
