//! Dataset-browsing client (decomposed into focused submodules)
//!
//! [`DatasetClient`] wires the shared components together: the transport,
//! the session store, the single-flight refresh coordinator, and the
//! authenticated request pipeline. It is cheap to clone, since all state is
//! behind `Arc`, so embedders can hand copies to views, background
//! tasks, and prefetch controllers freely.

mod auth;
mod datasets;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::pipeline::{Navigator, RequestPipeline};
use crate::refresh::RefreshCoordinator;
use crate::session::{CredentialStore, SessionStore};
use crate::transport::Transport;

/// Client-side core of the dataset browser
#[derive(Clone)]
pub struct DatasetClient {
    config: Arc<ClientConfig>,
    transport: Arc<Transport>,
    session: Arc<SessionStore>,
    pipeline: RequestPipeline,
    navigator: Arc<dyn Navigator>,
}

impl DatasetClient {
    /// Assemble a client from configuration, a credential store, and the
    /// embedder's navigator.
    ///
    /// Loads any persisted credentials from the store, so a client built
    /// over a previous session's store starts out logged in.
    pub fn new(
        config: ClientConfig,
        store: Box<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let transport = Arc::new(Transport::new(&config)?);
        let session = Arc::new(SessionStore::open(store)?);
        let refresher = Arc::new(RefreshCoordinator::new(transport.clone(), session.clone()));
        let pipeline = RequestPipeline::new(
            transport.clone(),
            session.clone(),
            refresher,
            navigator.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            transport,
            session,
            pipeline,
            navigator,
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The authenticated request pipeline, for endpoints not wrapped here.
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// True iff an access token is present. Never touches the network.
    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }
}

impl std::fmt::Debug for DatasetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetClient")
            .field("base_url", &self.config.base_url)
            .field("session", &self.session)
            .finish()
    }
}
