//! Environment probe: is positioning enabled, is the network reachable.

use std::sync::atomic::{AtomicBool, Ordering};

pub trait EnvironmentProbe: Send + Sync {
    fn positioning_enabled(&self) -> bool;
    fn network_reachable(&self) -> bool;

    /// Both positioning and network are available.
    fn is_online(&self) -> bool {
        self.positioning_enabled() && self.network_reachable()
    }
}

/// Probe backed by flags the host flips when it receives platform
/// notifications.
#[derive(Debug)]
pub struct FlagProbe {
    positioning: AtomicBool,
    network: AtomicBool,
}

impl Default for FlagProbe {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl FlagProbe {
    pub fn new(positioning: bool, network: bool) -> Self {
        Self {
            positioning: AtomicBool::new(positioning),
            network: AtomicBool::new(network),
        }
    }

    /// Returns true when this change restored full availability.
    pub fn set_positioning(&self, enabled: bool) -> bool {
        let was_online = self.is_online();
        self.positioning.store(enabled, Ordering::SeqCst);
        !was_online && self.is_online()
    }

    /// Returns true when this change restored full availability.
    pub fn set_network(&self, reachable: bool) -> bool {
        let was_online = self.is_online();
        self.network.store(reachable, Ordering::SeqCst);
        !was_online && self.is_online()
    }
}

impl EnvironmentProbe for FlagProbe {
    fn positioning_enabled(&self) -> bool {
        self.positioning.load(Ordering::SeqCst)
    }

    fn network_reachable(&self) -> bool {
        self.network.load(Ordering::SeqCst)
    }
}
