//! Configuration types for sampleview

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Main configuration for [`DatasetClient`](crate::client::DatasetClient)
///
/// Only `base_url` has no useful default; everything else works out of the
/// box. The prefetch thresholds mirror the viewer behavior: the refetch
/// trigger is derived from the window size rather than configured
/// separately, so the buffer always stays ahead of the viewer by the same
/// proportion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the backend server, e.g. `http://localhost:5000`
    pub base_url: Url,

    /// Per-request timeout (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Number of image URLs held in the prefetch window (default: 32)
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Accumulated wheel delta required to step one offset (default: 10)
    #[serde(default = "default_wheel_sensitivity")]
    pub wheel_sensitivity: i32,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: default_request_timeout(),
            window_size: default_window_size(),
            wheel_sensitivity: default_wheel_sensitivity(),
        }
    }

    /// Offset distance from the window center that triggers a refetch.
    ///
    /// Derived as `window_size / 2 - 2` so a refetch is issued while the
    /// viewer still has a margin of buffered entries in either direction.
    pub fn refetch_trigger(&self) -> u64 {
        (self.window_size as u64 / 2).saturating_sub(2)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

fn default_base_url() -> Url {
    match Url::parse("http://localhost:5000") {
        Ok(url) => url,
        Err(_) => unreachable!("literal url parses"),
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_window_size() -> usize {
    32
}

fn default_wheel_sensitivity() -> i32 {
    10
}
