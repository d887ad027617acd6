//! Order types - the unit of interest submitted to and resting in the book.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Process-unique order identifier. Allocated monotonically by the
/// [`OrderRegistry`](crate::registry::OrderRegistry) and never reused.
pub type OrderId = u64;

/// Order side (buy = bid, sell = ask)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side (bids)
    Buy,
    /// Sell side (asks)
    Sell,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// A limit order. While resting, the engine exclusively owns it; quantity only
/// ever decreases until it reaches zero (filled) or the order is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Engine-assigned id
    pub id: OrderId,
    /// Order side
    pub side: Side,
    /// Limit price, must be positive while resting
    pub price: Decimal,
    /// Remaining quantity, must be positive while resting
    pub quantity: Decimal,
}

/// An order request before the engine has assigned an id.
///
/// Strategies produce these; the simulation driver feeds them into
/// [`MatchingEngine::submit`](crate::engine::MatchingEngine::submit).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
}
