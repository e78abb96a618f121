//! The typed request pipeline.
//!
//! ```text
//! descriptor.build_request()
//!     -> cache policy from reachability
//!     -> transport.send()
//!     -> status validation
//!     -> descriptor.parse(body)
//! ```
//!
//! Every failure is returned to the caller unchanged. Nothing is retried.

use std::future::Future;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;

use capsule_core::{HttpRequest, RequestDescriptor};

use crate::config::ClientConfig;
use crate::error::{Error, TransportError};
use crate::reachability::ReachabilityMonitor;
use crate::transport::{HttpTransport, ReqwestTransport, ResponseCache};

/// Executes request descriptors.
///
/// Build one per process and share it by reference or `Arc`; concurrent
/// calls do not share any per-call state.
///
/// # Example
///
/// ```ignore
/// let monitor = ReachabilityMonitor::new();
/// monitor.start(path_updates);
///
/// let client = HttpClient::from_config(ClientConfig::default(), monitor)?;
/// let page: Page<Title> = client.execute(&popular_titles(1)).await?;
/// ```
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    reachability: ReachabilityMonitor,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        reachability: ReachabilityMonitor,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            reachability,
            config,
        }
    }

    /// A client backed by [`ReqwestTransport`] using `config.timeout` and a
    /// cache of `config.cache_capacity` responses.
    pub fn from_config(config: ClientConfig, reachability: ReachabilityMonitor) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(config.timeout)?
            .with_cache(ResponseCache::with_capacity(config.cache_capacity));
        Ok(Self::new(Arc::new(transport), reachability, config))
    }

    pub fn reachability(&self) -> &ReachabilityMonitor {
        &self.reachability
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build, send, validate against the configured status range, decode.
    pub async fn execute<D: RequestDescriptor>(&self, descriptor: &D) -> Result<D::Response, Error> {
        self.execute_with_range(descriptor, self.config.accepted_status.clone())
            .await
    }

    /// Like [`execute`](Self::execute) with a caller-chosen status range.
    pub async fn execute_with_range<D: RequestDescriptor>(
        &self,
        descriptor: &D,
        accepted: Range<u16>,
    ) -> Result<D::Response, Error> {
        let request = descriptor.build_request()?;
        let body = self.send(request, accepted).await?;
        Ok(descriptor.parse(&body)?)
    }

    /// Run [`execute`](Self::execute) until `cancel` resolves.
    ///
    /// If `cancel` wins, the in-flight transport call is dropped and the
    /// result is `TransportError::Cancelled`.
    pub async fn execute_until<D, F>(&self, descriptor: &D, cancel: F) -> Result<D::Response, Error>
    where
        D: RequestDescriptor,
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::debug!("request cancelled");
                Err(TransportError::Cancelled.into())
            }
            result = self.execute(descriptor) => result,
        }
    }

    /// Send a prepared request and return the raw body.
    ///
    /// The request's cache policy is overwritten from the current
    /// reachability: online requests bypass the cache, offline requests are
    /// served from it only.
    pub async fn send(&self, mut request: HttpRequest, accepted: Range<u16>) -> Result<Bytes, Error> {
        request.cache_policy = self.reachability.status().cache_policy();

        tracing::info!(
            method = %request.method,
            url = %request.url,
            cache_policy = ?request.cache_policy,
            "sending request"
        );

        let response = self.transport.send(request).await?;

        let status = http::StatusCode::from_u16(response.status)
            .map_err(|_| Error::MalformedResponse)?
            .as_u16();

        if !accepted.contains(&status) {
            tracing::debug!(status, ?accepted, "status code rejected");
            return Err(Error::InvalidStatusCode(status));
        }

        tracing::info!(status, "status code");
        Ok(response.body)
    }

    /// Fire-and-forget execution.
    ///
    /// The request is sent from a detached task that outlives this call and
    /// ignores its cancellation. This call waits `config.background_delay`
    /// and then parses an *empty* payload: the real response is never seen.
    /// Descriptors used here must accept an empty body (see
    /// `Capsule::tolerate_empty_payload`).
    pub async fn execute_background<D: RequestDescriptor>(
        &self,
        descriptor: &D,
    ) -> Result<D::Response, Error> {
        let request = descriptor.build_request()?;
        tracing::info!(url = %request.url, "background request");

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let url = request.url.clone();
            match transport.send(request).await {
                Ok(response) => {
                    tracing::debug!(%url, status = response.status, "background request finished")
                }
                Err(error) => tracing::debug!(%url, %error, "background request failed"),
            }
        });

        tokio::time::sleep(self.config.background_delay).await;
        Ok(descriptor.parse(&[])?)
    }
}
