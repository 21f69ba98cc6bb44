//! Common test utilities for sampleview end-to-end tests

use std::sync::{Arc, Mutex};

use sampleview::{ClientConfig, DatasetClient, MemoryCredentialStore, Navigator, RedirectTarget};
use wiremock::MockServer;

/// Navigator that records every instruction for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<RedirectTarget>>,
    reloads: Mutex<usize>,
}

#[allow(dead_code)]
impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<RedirectTarget> {
        self.redirects.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> usize {
        *self.reloads.lock().unwrap()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: RedirectTarget) {
        self.redirects.lock().unwrap().push(target);
    }

    fn reload(&self) {
        *self.reloads.lock().unwrap() += 1;
    }
}

/// A client over a fresh in-memory store, pointed at the mock server.
pub fn client_for(server: &MockServer) -> (DatasetClient, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let config = ClientConfig::new(server.uri().parse().expect("mock server uri parses"));
    let client = DatasetClient::new(
        config,
        Box::new(MemoryCredentialStore::new()),
        navigator.clone(),
    )
    .expect("client assembles");
    (client, navigator)
}
