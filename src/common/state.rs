//! Shared run state
//!
//! The only state shared between the relay, its forwarding units and the
//! notification decoder. `running` starts true and is flipped to false
//! exactly once; the cancellation token lets blocked reads and accepts
//! observe the stop without waiting for the peer.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Cooperative stop signal shared by every task of a component
#[derive(Debug)]
pub struct RelayState {
    running: AtomicBool,
    shutdown: CancellationToken,
}

impl RelayState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            shutdown: CancellationToken::new(),
        }
    }

    /// Whether stop has not been requested yet
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request a stop
    ///
    /// Never blocks. Returns `true` for the call that actually flipped the
    /// flag; later calls are no-ops and return `false`.
    pub fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if was_running {
            self.shutdown.cancel();
        }
        was_running
    }

    /// Token cancelled when [`stop`](Self::stop) is first called
    pub fn token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Token cancelled on stop or when cancelled directly
    ///
    /// Used to tie the two directions of one connection together.
    pub fn child_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_idempotent() {
        let state = RelayState::new();
        assert!(state.is_running());
        assert!(!state.token().is_cancelled());

        assert!(state.stop());
        assert!(!state.is_running());
        assert!(state.token().is_cancelled());

        assert!(!state.stop());
        assert!(!state.is_running());
    }

    #[test]
    fn test_child_token_follows_parent_only() {
        let state = RelayState::new();
        let pair = state.child_token();
        let other = state.child_token();

        pair.cancel();
        assert!(pair.is_cancelled());
        assert!(!other.is_cancelled());
        assert!(state.is_running());

        state.stop();
        assert!(other.is_cancelled());
    }
}
