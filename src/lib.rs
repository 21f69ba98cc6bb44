//! # sampleview
//!
//! Client-side core for dataset browsing tools that talk to a backend
//! over HTTP.
//!
//! ## Design Philosophy
//!
//! sampleview is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Framework-independent** - Pure async operations invoked explicitly;
//!   no coupling to view lifecycles, routers, or window objects
//! - **Resilient** - Expiring access tokens are renewed transparently,
//!   with deterministic routing to login or onboarding when renewal fails
//! - **Latency-hiding** - Image sequences are prefetched in fixed-size
//!   windows so a scrubbing viewer never waits on the network
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use sampleview::{
//!     ClientConfig, DatasetClient, JsonFileCredentialStore, NoOpNavigator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("http://localhost:5000".parse()?);
//!     let store = Box::new(JsonFileCredentialStore::new("session.json"));
//!     let client = DatasetClient::new(config, store, Arc::new(NoOpNavigator))?;
//!
//!     if !client.is_logged_in() {
//!         client.login("a@b.com", "password").await?;
//!     }
//!
//!     for dataset in client.list_datasets().await? {
//!         println!("{}", dataset.name);
//!     }
//!
//!     // Scrub through a 3D sample's image sequence
//!     let mut window = client.prefetch_controller("ct_scans", "scan-0001");
//!     window.refetch_window(0).await?;
//!     if let Some(url) = window.current_url() {
//!         println!("frame: {url}");
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Dataset-browsing client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Authenticated request pipeline
pub mod pipeline;
/// Windowed prefetch of image URL sequences
pub mod prefetch;
/// Access-token renewal
pub mod refresh;
/// Session state and credential persistence
pub mod session;
/// HTTP transport and request descriptors
pub mod transport;
/// Wire types for the server API
pub mod types;
/// Wheel-gesture smoothing
pub mod wheel;

// Re-export commonly used types
pub use client::DatasetClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use pipeline::{Navigator, NoOpNavigator, RedirectTarget, RequestPipeline};
pub use prefetch::{FrameSource, PrefetchController};
pub use refresh::RefreshCoordinator;
pub use session::{
    CredentialStore, Credentials, JsonFileCredentialStore, MemoryCredentialStore, SessionStore,
};
pub use transport::{ApiResponse, Method, RequestDescriptor, Transport};
pub use types::{
    DatasetSummary, LoginResponse, RefreshResponse, RegisterOutcome, SampleFilter, SampleSummary,
    SetupStatus,
};
pub use wheel::WheelSmoother;
