//! Network reachability tracking.
//!
//! The OS reports network-path changes as best-effort notifications. The
//! monitor folds them into a two-state flag that the client reads before
//! every request to choose a cache policy.
//!
//! ```text
//!              Satisfied
//!   +-----------+  <----------  +-------------+
//!   | Reachable |               | Unreachable |
//!   +-----------+  ---------->  +-------------+
//!     (initial)    anything else
//! ```
//!
//! A single notification flips the state; there is no debouncing. If the
//! signal never fires the monitor stays `Reachable`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use capsule_core::CachePolicy;

/// Network-path status as delivered by the OS signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// A usable path exists.
    Satisfied,
    /// No usable path.
    Unsatisfied,
    /// A path could exist once a connection is brought up (e.g. VPN on demand).
    RequiresConnection,
}

/// Whether the network is currently believed usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reachability {
    #[default]
    Reachable,
    Unreachable,
}

impl Reachability {
    const REACHABLE: u8 = 0;
    const UNREACHABLE: u8 = 1;

    fn to_u8(self) -> u8 {
        match self {
            Reachability::Reachable => Self::REACHABLE,
            Reachability::Unreachable => Self::UNREACHABLE,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            Self::UNREACHABLE => Reachability::Unreachable,
            _ => Reachability::Reachable,
        }
    }

    pub fn is_reachable(&self) -> bool {
        *self == Reachability::Reachable
    }

    /// Online: always fetch fresh data. Offline: serve whatever is cached.
    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            Reachability::Reachable => CachePolicy::ReloadIgnoringLocalCache,
            Reachability::Unreachable => CachePolicy::ReturnCacheDataDontLoad,
        }
    }
}

impl From<PathStatus> for Reachability {
    fn from(status: PathStatus) -> Self {
        match status {
            PathStatus::Satisfied => Reachability::Reachable,
            PathStatus::Unsatisfied | PathStatus::RequiresConnection => Reachability::Unreachable,
        }
    }
}

impl From<Reachability> for CachePolicy {
    fn from(reachability: Reachability) -> Self {
        reachability.cache_policy()
    }
}

/// Shared handle to the reachability flag.
///
/// Clones observe and update the same flag. Reads never block.
#[derive(Debug, Clone)]
pub struct ReachabilityMonitor {
    state: Arc<AtomicU8>,
}

impl Default for ReachabilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachabilityMonitor {
    /// A monitor in the initial `Reachable` state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(Reachability::Reachable.to_u8())),
        }
    }

    /// Last known reachability.
    pub fn status(&self) -> Reachability {
        Reachability::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Apply one notification from the network-path signal.
    pub fn update(&self, path: PathStatus) -> Reachability {
        let next = Reachability::from(path);
        let previous = Reachability::from_u8(self.state.swap(next.to_u8(), Ordering::AcqRel));
        if previous != next {
            tracing::debug!(?path, from = ?previous, to = ?next, "reachability changed");
        }
        next
    }

    /// Subscribe to a stream of path notifications.
    ///
    /// Spawns a task that applies every notification until all senders are
    /// dropped. Requires a running tokio runtime.
    pub fn start(&self, mut updates: mpsc::Receiver<PathStatus>) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            while let Some(path) = updates.recv().await {
                monitor.update(path);
            }
            tracing::debug!("reachability signal closed");
        })
    }
}
