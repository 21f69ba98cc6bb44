//! Authenticated request pipeline
//!
//! [`RequestPipeline::execute`] attaches the current access token to a
//! request descriptor and performs it. An auth failure (401/422) is
//! recovered once: renew the token through the refresh coordinator, then
//! retry the same descriptor with the new token. When recovery is
//! impossible (the refresh token itself was rejected, or the retry fails
//! authentication again), the pipeline routes the embedding application
//! to login or onboarding through the [`Navigator`] seam and resolves
//! with [`Error::SessionExpired`].
//!
//! Per-call state machine:
//!
//! ```text
//! IDLE → REQUESTING → SUCCESS
//!                   → OTHER_ERROR
//!                   → AUTH_FAILED → REFRESHING → RETRYING → SUCCESS
//!                                                         → OTHER_ERROR
//!                                             → FAILURE(redirect)
//! ```
//!
//! At most one retry per logical call. Concurrent calls are not
//! serialized against each other; only their refreshes coalesce.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::refresh::RefreshCoordinator;
use crate::session::SessionStore;
use crate::transport::{ApiResponse, RequestDescriptor, Transport};
use crate::types::SetupStatus;

/// Where the embedding application is routed on terminal auth failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectTarget {
    /// The one-time account-setup flow (no account exists yet)
    Setup,
    /// The login flow
    Login,
}

impl std::fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedirectTarget::Setup => write!(f, "setup"),
            RedirectTarget::Login => write!(f, "login"),
        }
    }
}

/// Navigation seam supplied by the embedding application
///
/// The pipeline never touches windows, routers, or views; it reports the
/// navigation it needs and the embedder replaces the client state. After
/// `redirect` is called the triggering operation does not produce a
/// response, so implementations should abandon in-flight work.
pub trait Navigator: Send + Sync {
    /// Route to the given flow, replacing the current client state.
    fn redirect(&self, target: RedirectTarget);

    /// Reload the client state from scratch (logout path).
    fn reload(&self);
}

/// Navigator that ignores every instruction
///
/// Useful for headless embedders (scripts, batch jobs) that inspect the
/// returned [`Error::SessionExpired`] instead of being navigated.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNavigator;

impl Navigator for NoOpNavigator {
    fn redirect(&self, _target: RedirectTarget) {}
    fn reload(&self) {}
}

/// Executes request descriptors with transparent token renewal
#[derive(Clone)]
pub struct RequestPipeline {
    transport: Arc<Transport>,
    session: Arc<SessionStore>,
    refresher: Arc<RefreshCoordinator>,
    navigator: Arc<dyn Navigator>,
}

impl RequestPipeline {
    /// Assemble a pipeline over shared components.
    pub fn new(
        transport: Arc<Transport>,
        session: Arc<SessionStore>,
        refresher: Arc<RefreshCoordinator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            session,
            refresher,
            navigator,
        }
    }

    /// Execute a descriptor against a protected endpoint.
    ///
    /// Returns the response for 2xx, propagates non-auth errors
    /// untouched, and recovers an auth failure at most once via refresh.
    /// A terminal auth failure resolves with [`Error::SessionExpired`]
    /// after the navigator has been invoked; callers must treat that
    /// variant as "navigation happened", not as a displayable error.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        let token = self.session.access_token().unwrap_or_default();

        let failed_status = match self.transport.send(descriptor, Some(&token)).await {
            Err(Error::Auth { status }) => status,
            outcome => return outcome,
        };

        tracing::debug!(
            path = %descriptor.path,
            status = failed_status,
            "access token rejected, renewing"
        );

        let new_token = match self.refresher.refresh(&token).await {
            Ok(new_token) => new_token,
            Err(e) => {
                tracing::warn!(error = %e, "token renewal failed, session is unrecoverable");
                return self.expire_session().await;
            }
        };

        match self.transport.send(descriptor, Some(&new_token)).await {
            // A second auth failure after a successful renewal is terminal;
            // no second refresh is attempted.
            Err(Error::Auth { status }) => {
                tracing::warn!(
                    path = %descriptor.path,
                    status,
                    "retry rejected with fresh token, session is unrecoverable"
                );
                self.expire_session().await
            }
            outcome => outcome,
        }
    }

    /// Route the embedder to setup or login and report session expiry.
    async fn expire_session(&self) -> Result<ApiResponse> {
        let target = if self.account_initialized().await {
            RedirectTarget::Login
        } else {
            RedirectTarget::Setup
        };
        tracing::info!(%target, "redirecting after unrecoverable auth failure");
        self.navigator.redirect(target);
        Err(Error::SessionExpired { redirect: target })
    }

    /// Probe `GET /setup` for whether any account exists.
    ///
    /// When the probe itself fails there is nothing to set up against, so
    /// the login flow is chosen.
    async fn account_initialized(&self) -> bool {
        let descriptor = RequestDescriptor::get("/setup");
        match self.transport.send(&descriptor, None).await {
            Ok(response) => match response.parse::<SetupStatus>() {
                Ok(status) => status.initialized,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed setup status, assuming initialized");
                    true
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "setup probe failed, assuming initialized");
                true
            }
        }
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("session", &self.session)
            .finish()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::MemoryCredentialStore;
    use std::sync::Mutex;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records redirect/reload calls for assertions.
    #[derive(Debug, Default)]
    struct RecordingNavigator {
        redirects: Mutex<Vec<RedirectTarget>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect(&self, target: RedirectTarget) {
            self.redirects.lock().unwrap().push(target);
        }
        fn reload(&self) {}
    }

    impl RecordingNavigator {
        fn redirects(&self) -> Vec<RedirectTarget> {
            self.redirects.lock().unwrap().clone()
        }
    }

    fn pipeline_for(
        server: &MockServer,
    ) -> (RequestPipeline, Arc<SessionStore>, Arc<RecordingNavigator>) {
        let config = ClientConfig::new(server.uri().parse().unwrap());
        let transport = Arc::new(Transport::new(&config).unwrap());
        let session =
            Arc::new(SessionStore::open(Box::new(MemoryCredentialStore::new())).unwrap());
        let refresher = Arc::new(RefreshCoordinator::new(transport.clone(), session.clone()));
        let navigator = Arc::new(RecordingNavigator::default());
        let pipeline = RequestPipeline::new(transport, session.clone(), refresher, navigator.clone());
        (pipeline, session, navigator)
    }

    #[tokio::test]
    async fn valid_token_executes_once_without_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .and(bearer_token("T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "datasets": [],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (pipeline, session, navigator) = pipeline_for(&server);
        session.store_login("a@b.com", "R1", "T1").unwrap();

        let response = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn auth_failure_refreshes_and_retries_once() {
        let server = MockServer::start().await;
        // First attempt with the stale token fails
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .and(bearer_token("T1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .and(bearer_token("R1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "T2",
            })))
            .expect(1)
            .mount(&server)
            .await;
        // Retry with the renewed token succeeds
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .and(bearer_token("T2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "datasets": [{"name": "mnist", "info": null,
                              "created_at": "Mon, 06 Jan 2020 00:00:00 GMT"}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (pipeline, session, navigator) = pipeline_for(&server);
        session.store_login("a@b.com", "R1", "T1").unwrap();

        let response = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(session.access_token().as_deref(), Some("T2"));
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn refresh_failure_redirects_to_login_when_initialized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/setup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "initialized": true,
            })))
            .mount(&server)
            .await;

        let (pipeline, session, navigator) = pipeline_for(&server);
        session.store_login("a@b.com", "expired", "T1").unwrap();

        let err = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::SessionExpired {
                redirect: RedirectTarget::Login
            }
        ));
        assert_eq!(navigator.redirects(), vec![RedirectTarget::Login]);
    }

    #[tokio::test]
    async fn refresh_failure_redirects_to_setup_when_uninitialized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/setup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "initialized": false,
            })))
            .mount(&server)
            .await;

        let (pipeline, session, navigator) = pipeline_for(&server);
        session.store_login("a@b.com", "expired", "T1").unwrap();

        let err = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::SessionExpired {
                redirect: RedirectTarget::Setup
            }
        ));
        assert_eq!(navigator.redirects(), vec![RedirectTarget::Setup]);
    }

    #[tokio::test]
    async fn auth_failure_on_retry_is_terminal_with_no_second_refresh() {
        let server = MockServer::start().await;
        // Both the first attempt and the retry are rejected
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "T2",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/setup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "initialized": true,
            })))
            .mount(&server)
            .await;

        let (pipeline, session, navigator) = pipeline_for(&server);
        session.store_login("a@b.com", "R1", "T1").unwrap();

        let err = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SessionExpired { .. }));
        assert_eq!(navigator.redirects(), vec![RedirectTarget::Login]);
    }

    #[tokio::test]
    async fn non_auth_errors_propagate_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (pipeline, session, navigator) = pipeline_for(&server);
        session.store_login("a@b.com", "R1", "T1").unwrap();

        let err = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Server { status: 500, .. }));
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn setup_probe_failure_defaults_to_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/setup"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (pipeline, session, navigator) = pipeline_for(&server);
        session.store_login("a@b.com", "expired", "T1").unwrap();

        let err = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::SessionExpired {
                redirect: RedirectTarget::Login
            }
        ));
        assert_eq!(navigator.redirects(), vec![RedirectTarget::Login]);
    }

    #[tokio::test]
    async fn logged_out_session_flows_to_redirect() {
        let server = MockServer::start().await;
        // No token at all: the server rejects, refresh rejects, redirect
        Mock::given(method("GET"))
            .and(path("/datasets/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/setup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "initialized": true,
            })))
            .mount(&server)
            .await;

        let (pipeline, _session, navigator) = pipeline_for(&server);

        let err = pipeline
            .execute(&RequestDescriptor::get("/datasets/"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SessionExpired { .. }));
        assert_eq!(navigator.redirects(), vec![RedirectTarget::Login]);
    }
}
