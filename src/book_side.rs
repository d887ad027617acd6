//! Book Side - the price-indexed half of the order book.
//!
//! A mapping from price to [`PriceLevel`] plus a best-price heap. Heap entries
//! can go stale when a level empties; the level-deletion path purges stale
//! heads until the heap head is live again, so `best_price()` is a plain peek.
//! This keeps cancellation cheap at the cost of amortized best-price upkeep.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::order::{Order, Side};
use crate::price_level::PriceLevel;

/// Heap key ordered so that the heap head is always the best price for the
/// side: highest first for bids, lowest first for asks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PriceKey {
    price: Decimal,
    side: Side,
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.side {
            Side::Buy => self.price.cmp(&other.price),
            Side::Sell => other.price.cmp(&self.price),
        }
    }
}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One side of the book: all resting interest for bids or for asks.
pub struct BookSide {
    side: Side,
    levels: FxHashMap<Decimal, PriceLevel>,
    prices: BinaryHeap<PriceKey>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: FxHashMap::default(),
            prices: BinaryHeap::new(),
        }
    }

    /// Which side this is
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// The best resting price: highest bid or lowest ask.
    ///
    /// Invariant: the heap head always refers to a live level, because
    /// [`delete_level`](Self::delete_level) purges stale heads.
    #[inline]
    pub fn best_price(&self) -> Option<Decimal> {
        let best = self.prices.peek().map(|k| k.price);
        debug_assert!(
            best.map_or(true, |p| self.levels.contains_key(&p)),
            "stale heap head survived level deletion"
        );
        best
    }

    /// The level at an exact price, if present.
    #[inline]
    pub fn level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Mutable access to the level at an exact price.
    #[inline]
    pub fn level_mut(&mut self, price: Decimal) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Rest an order at its price, creating the level if needed.
    ///
    /// The price is pushed onto the heap only when the level is new, so at
    /// most one live heap entry exists per price.
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side);
        let price = order.price;
        let level = self.levels.entry(price).or_insert_with(|| {
            self.prices.push(PriceKey {
                price,
                side: self.side,
            });
            PriceLevel::new()
        });
        level.add(order);
    }

    /// Drop a level from the index and purge stale heap heads.
    ///
    /// Must be called the moment a level empties. Pops heap entries whose
    /// price no longer has a level until the head is live (or the heap is
    /// empty); stale entries deeper in the heap are purged when they surface.
    pub fn delete_level(&mut self, price: Decimal) {
        self.levels.remove(&price);
        while let Some(head) = self.prices.peek() {
            if self.levels.contains_key(&head.price) {
                break;
            }
            self.prices.pop();
        }
    }

    /// All levels as `(price, aggregate_quantity)`, best first.
    ///
    /// Computed from the level map, never the heap. Zero aggregates are
    /// filtered out even though the invariants make them impossible.
    pub fn depth(&self) -> Vec<(Decimal, Decimal)> {
        let mut prices: Vec<Decimal> = self.levels.keys().copied().collect();
        match self.side {
            Side::Buy => prices.sort_unstable_by(|a, b| b.cmp(a)),
            Side::Sell => prices.sort_unstable(),
        }
        prices
            .into_iter()
            .filter_map(|p| {
                let qty = self.levels[&p].total_quantity();
                (qty > Decimal::ZERO).then_some((p, qty))
            })
            .collect()
    }

    /// Number of live price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// True when no orders rest on this side
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl std::fmt::Debug for BookSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookSide")
            .field("side", &self.side)
            .field("best_price", &self.best_price())
            .field("levels", &self.levels.len())
            .finish()
    }
}
