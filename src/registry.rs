//! Order Registry - resting-order locations and id allocation.
//!
//! Maps an order id to its current resting (price, side) so cancel and amend
//! resolve in O(lookup) instead of scanning levels. An id is present if and
//! only if the order is currently resting at exactly that location.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::order::{OrderId, Side};

/// Where a resting order currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestingLocation {
    pub price: Decimal,
    pub side: Side,
}

/// Registry of resting orders plus the engine's monotonic id counter.
///
/// Ids start at 1 and are never reused, including for rejected submissions
/// and across amend-driven resubmission (which re-enters under the original
/// id without touching the counter).
#[derive(Clone, Debug, Default)]
pub struct OrderRegistry {
    entries: FxHashMap<OrderId, RestingLocation>,
    next_id: OrderId,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Hand out the next order id.
    #[inline]
    pub fn allocate_id(&mut self) -> OrderId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Record that an order now rests at (price, side).
    #[inline]
    pub fn insert(&mut self, id: OrderId, price: Decimal, side: Side) {
        self.entries.insert(id, RestingLocation { price, side });
    }

    /// Look up where an order rests.
    #[inline]
    pub fn get(&self, id: OrderId) -> Option<RestingLocation> {
        self.entries.get(&id).copied()
    }

    /// Remove an order's entry, returning its last location.
    #[inline]
    pub fn remove(&mut self, id: OrderId) -> Option<RestingLocation> {
        self.entries.remove(&id)
    }

    /// Number of currently resting orders
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
