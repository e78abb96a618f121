//! HTTP transport abstraction.
//!
//! The client only needs "send this request, give me status and bytes".
//! [`HttpTransport`] is that seam; tests swap in a recording mock, production
//! uses [`ReqwestTransport`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use capsule_core::{CachePolicy, HttpRequest, HttpResponse, Method};

use crate::error::TransportError;

/// Executes HTTP requests.
///
/// Implementations own connection pooling, TLS, redirects and timeouts, and
/// must honor [`HttpRequest::cache_policy`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the raw response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Entries kept by [`ResponseCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// In-memory store of successful GET responses.
///
/// Entries are keyed by the request URL together with every request header,
/// so two requests for the same URL with different credentials never share
/// an entry. At most `capacity` entries are kept; inserting past that evicts
/// the least recently used one. Clones share the same entries.
#[derive(Clone)]
pub struct ResponseCache {
    state: Arc<Mutex<CacheState>>,
}

struct CacheState {
    entries: HashMap<String, HttpResponse>,
    /// Keys, most recently used first.
    recency: VecDeque<String>,
    capacity: usize,
}

impl CacheState {
    fn touch(&mut self, key: &str) {
        if let Some(position) = self.recency.iter().position(|k| k == key) {
            if let Some(key) = self.recency.remove(position) {
                self.recency.push_front(key);
            }
        }
    }

    fn forget(&mut self, key: &str) -> Option<HttpResponse> {
        self.recency.retain(|k| k != key);
        self.entries.remove(key)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` responses. Zero disables storage.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: VecDeque::new(),
                capacity,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cache key: the URL followed by the sorted request headers.
    fn key(request: &HttpRequest) -> String {
        let mut headers: Vec<(&str, &[u8])> = request
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_bytes()))
            .collect();
        headers.sort();

        let mut key = request.url.to_string();
        for (name, value) in headers {
            key.push('\n');
            key.push_str(name);
            key.push(':');
            key.push_str(&String::from_utf8_lossy(value));
        }
        key
    }

    pub fn get(&self, request: &HttpRequest) -> Option<HttpResponse> {
        let key = Self::key(request);
        let mut state = self.state();
        let response = state.entries.get(&key).cloned()?;
        state.touch(&key);
        Some(response)
    }

    pub fn insert(&self, request: &HttpRequest, response: HttpResponse) {
        let key = Self::key(request);
        let mut state = self.state();
        if state.capacity == 0 {
            return;
        }

        state.forget(&key);
        while state.entries.len() >= state.capacity {
            match state.recency.pop_back() {
                Some(evicted) => {
                    state.entries.remove(&evicted);
                }
                None => break,
            }
        }
        state.recency.push_front(key.clone());
        state.entries.insert(key, response);
    }

    pub fn remove(&self, request: &HttpRequest) -> Option<HttpResponse> {
        self.state().forget(&Self::key(request))
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.recency.clear();
    }

    pub fn capacity(&self) -> usize {
        self.state().capacity
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }
}

/// Production transport using reqwest.
///
/// Keeps its own [`ResponseCache`]:
///
/// - `ReturnCacheDataDontLoad` is answered from the cache only, failing with
///   [`TransportError::NotCached`] when there is no entry.
/// - Every other policy goes to the network, and 2xx GET responses are
///   stored for later cache-only reads.
pub struct ReqwestTransport {
    client: Client,
    cache: ResponseCache,
}

impl ReqwestTransport {
    /// Create a new transport with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            cache: ResponseCache::new(),
        })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, TransportError> {
        Self::new(Duration::from_secs(30))
    }

    /// Use `cache` instead of a private one, e.g. to share it between
    /// transports or to pre-seed it.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method: http::Method = request.method.into();

        let mut req_builder = self
            .client
            .request(method, request.url.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let response = req_builder.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.cache_policy == CachePolicy::ReturnCacheDataDontLoad {
            return match self.cache.get(&request) {
                Some(response) => {
                    tracing::debug!(url = %request.url, "served from cache");
                    Ok(response)
                }
                None => {
                    tracing::debug!(url = %request.url, "cache miss on cache-only request");
                    Err(TransportError::NotCached {
                        url: request.url.to_string(),
                    })
                }
            };
        }

        let response = self.fetch(&request).await?;

        if request.method == Method::GET && response.is_success() {
            self.cache.insert(&request, response.clone());
        }

        Ok(response)
    }
}
