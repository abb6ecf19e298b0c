//! Scheduler-owned run state and the determinism fingerprint.

/// Mutable run state tracked by the engine. Passed around explicitly rather
/// than held in globals, so independent runs never share anything.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Time of the most recently dispatched event.
    pub clock: f64,
    /// Products that have left the system.
    pub products_departed: u64,
    /// Start of the statistics window (0, or the warm-up reset time).
    pub stats_start: f64,
    /// Products departed when the statistics window started.
    pub products_at_stats_start: u64,
    /// Events dispatched so far.
    pub dispatched: u64,
    /// Next sequence number per component type.
    pub next_component: [u64; 3],
}

impl SimState {
    /// Create a new state starting at time 0.
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            products_departed: 0,
            stats_start: 0.0,
            products_at_stats_start: 0,
            dispatched: 0,
            next_component: [0; 3],
        }
    }

    /// Length of the statistics window so far.
    pub fn window(&self) -> f64 {
        self.clock - self.stats_start
    }

    /// Products departed inside the statistics window.
    pub fn products_in_window(&self) -> u64 {
        self.products_departed - self.products_at_stats_start
    }
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple deterministic hash of simulation state for comparing runs.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed an `f64` by its exact bit pattern.
    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
