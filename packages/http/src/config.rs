use std::ops::Range;
use std::time::Duration;

use crate::transport::DEFAULT_CACHE_CAPACITY;

/// Construction-time settings for [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Status codes accepted by `execute`. Anything else is
    /// `Error::InvalidStatusCode`.
    pub accepted_status: Range<u16>,

    /// How long `execute_background` waits before handing an empty payload
    /// to the parser.
    pub background_delay: Duration,

    /// Request timeout for the default reqwest transport.
    pub timeout: Duration,

    /// Responses kept by the default reqwest transport's cache.
    pub cache_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            accepted_status: 200..400,
            background_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(30),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn with_accepted_status(mut self, accepted_status: Range<u16>) -> Self {
        self.accepted_status = accepted_status;
        self
    }

    pub fn with_background_delay(mut self, background_delay: Duration) -> Self {
        self.background_delay = background_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }
}
