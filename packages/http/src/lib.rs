//! # capsule-http
//!
//! Executes `capsule-core` request descriptors over HTTP.
//!
//! ## Pipeline
//!
//! [`HttpClient::execute`] builds the descriptor's request, picks a cache
//! policy from the [`ReachabilityMonitor`], sends it through an
//! [`HttpTransport`], checks the status code against the accepted range
//! (200..400 by default) and hands the body back to the descriptor to decode.
//!
//! | Reachability  | Cache policy                | Effect                      |
//! |---------------|-----------------------------|-----------------------------|
//! | `Reachable`   | `ReloadIgnoringLocalCache`  | always fetch fresh data     |
//! | `Unreachable` | `ReturnCacheDataDontLoad`   | serve the cached copy only  |
//!
//! ## Wiring
//!
//! ```ignore
//! use capsule_http::{ClientConfig, HttpClient, PathStatus, ReachabilityMonitor};
//!
//! let monitor = ReachabilityMonitor::new();
//! let (path_tx, path_rx) = tokio::sync::mpsc::channel(16);
//! monitor.start(path_rx);
//! // platform glue: path_tx.send(PathStatus::Satisfied).await
//!
//! let client = HttpClient::from_config(ClientConfig::default(), monitor)?;
//! let page = client.execute(&popular_titles(1)).await?;
//! ```
//!
//! ## Background requests
//!
//! [`HttpClient::execute_background`] dispatches the request on a detached
//! task and returns after a fixed delay with an empty payload. Use it for
//! telemetry-style calls whose response does not matter.

pub mod client;
pub mod config;
pub mod error;
pub mod reachability;
pub mod transport;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use error::{Error, TransportError};
pub use reachability::{PathStatus, Reachability, ReachabilityMonitor};
pub use transport::{HttpTransport, ReqwestTransport, ResponseCache, DEFAULT_CACHE_CAPACITY};

pub use capsule_core;
