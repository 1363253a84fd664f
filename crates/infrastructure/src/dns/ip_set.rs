use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin cursor over the addresses resolved for one upstream host.
///
/// The address list is fixed at construction; the cursor is the only
/// thing that ever changes. `rotate` advances with a single
/// compare-and-swap: two racing callers can compute the same successor
/// and only one swap lands, so an advance may be lost under contention.
/// The cursor only ever moves forward, wrapping at the end.
#[derive(Debug)]
pub struct IpSet {
    values: Vec<IpAddr>,
    index: AtomicUsize,
}

impl IpSet {
    /// `values` must be non-empty; every resolution path checks this
    /// before building a set.
    pub fn new(values: Vec<IpAddr>) -> Self {
        debug_assert!(!values.is_empty());
        Self {
            values,
            index: AtomicUsize::new(0),
        }
    }

    pub fn current(&self) -> IpAddr {
        self.values[self.index.load(Ordering::Relaxed)]
    }

    pub fn rotate(&self) {
        let old = self.index.load(Ordering::Relaxed);
        let new = (old + 1) % self.values.len();
        let _ = self
            .index
            .compare_exchange(old, new, Ordering::Relaxed, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[IpAddr] {
        &self.values
    }
}
