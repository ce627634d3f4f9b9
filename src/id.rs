//! Correlation identifier allocation.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{IpcError, IpcResult};
use crate::protocol::RequestId;

/// Default upper bound of the identifier space.
pub const DEFAULT_ID_MAX: u32 = 15_000;

/// Allocates collision-free correlation ids by rejection sampling.
///
/// Uniform draws avoid a monotonic counter that would have to survive
/// worker restarts. With the default space of 15 000 ids and a handful
/// outstanding at once, the retry loop almost never spins; the explicit
/// bound guard keeps it from degenerating if a caller lets the outstanding
/// set grow unchecked.
#[derive(Debug)]
pub struct IdAllocator {
    outstanding: HashSet<RequestId>,
    id_max: u32,
}

impl IdAllocator {
    /// Create an allocator over `[1, id_max]`.
    pub fn new(id_max: u32) -> Self {
        Self {
            outstanding: HashSet::new(),
            id_max,
        }
    }

    /// Draw a fresh id, register it outstanding, and return it.
    ///
    /// Fails with `IdSpaceExhausted` once half the id space is occupied;
    /// past that point rejection sampling degrades toward non-termination.
    pub fn allocate(&mut self) -> IpcResult<RequestId> {
        if self.outstanding.len() as u64 * 2 >= u64::from(self.id_max) {
            return Err(IpcError::IdSpaceExhausted {
                outstanding: self.outstanding.len(),
                id_max: self.id_max,
            });
        }

        let mut rng = rand::rng();
        loop {
            let id = rng.random_range(1..=self.id_max);
            if self.outstanding.insert(id) {
                return Ok(id);
            }
        }
    }

    /// Release an id observed in a response. Unknown ids are ignored.
    pub fn release(&mut self, id: RequestId) {
        self.outstanding.remove(&id);
    }

    /// Whether `id` is still awaiting a response.
    pub fn is_outstanding(&self, id: RequestId) -> bool {
        self.outstanding.contains(&id)
    }

    /// Number of ids currently awaiting a response.
    pub fn outstanding_len(&self) -> usize {
        self.outstanding.len()
    }

    /// Forget every outstanding id. Used when the worker they were bound
    /// to is gone for good and no response can ever arrive.
    pub fn clear(&mut self) {
        self.outstanding.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocations_are_distinct_and_in_range() {
        let mut ids = IdAllocator::new(DEFAULT_ID_MAX);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let id = ids.allocate().unwrap();
            assert!((1..=DEFAULT_ID_MAX).contains(&id));
            assert!(seen.insert(id), "id {} allocated twice", id);
        }
        assert_eq!(ids.outstanding_len(), 500);
    }

    #[test]
    fn test_release_frees_an_id() {
        let mut ids = IdAllocator::new(100);
        let id = ids.allocate().unwrap();
        assert!(ids.is_outstanding(id));
        ids.release(id);
        assert!(!ids.is_outstanding(id));
        // Releasing twice is a no-op.
        ids.release(id);
        assert_eq!(ids.outstanding_len(), 0);
    }

    #[test]
    fn test_exhaustion_guard_trips_at_half_capacity() {
        let mut ids = IdAllocator::new(8);
        for _ in 0..4 {
            ids.allocate().unwrap();
        }
        let err = ids.allocate().unwrap_err();
        assert!(matches!(
            err,
            IpcError::IdSpaceExhausted {
                outstanding: 4,
                id_max: 8
            }
        ));
    }

    #[test]
    fn test_clear_resets_the_space() {
        let mut ids = IdAllocator::new(8);
        for _ in 0..4 {
            ids.allocate().unwrap();
        }
        ids.clear();
        assert_eq!(ids.outstanding_len(), 0);
        assert!(ids.allocate().is_ok());
    }
}
