//! Matching Engine - the crossing/resting algorithm over the two book sides.
//!
//! Every operation is synchronous and runs to completion before returning;
//! the engine performs no internal locking and assumes a single logical
//! caller. Listener callbacks fire inline during the triggering call.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::book_side::BookSide;
use crate::events::{EventListener, NullListener, RejectReason, Trade};
use crate::order::{Order, OrderId, Side};
use crate::registry::OrderRegistry;

/// The matching engine: two price-indexed book sides, the order registry,
/// and a registered event listener.
///
/// Matching is price-time priority with the trade-at-maker-price rule: an
/// aggressor fills against the opposite side's best levels head-first, always
/// at the resting order's price.
pub struct MatchingEngine<L: EventListener = NullListener> {
    bids: BookSide,
    asks: BookSide,
    registry: OrderRegistry,
    listener: L,
}

impl MatchingEngine {
    /// Create an engine that discards events.
    pub fn new() -> Self {
        Self::with_listener(NullListener)
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: EventListener> MatchingEngine<L> {
    /// Create an engine with a registered event listener.
    pub fn with_listener(listener: L) -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            registry: OrderRegistry::new(),
            listener,
        }
    }

    // ========================================================================
    // Public API
    // ========================================================================

    /// Submit a limit order.
    ///
    /// Allocates an id, validates, fires the accept event, crosses against
    /// the opposite side while prices overlap, and rests any remainder.
    ///
    /// # Returns
    /// The assigned order id, or `None` on rejection. A rejected submission
    /// fires only the reject event and mutates nothing.
    pub fn submit(&mut self, side: Side, price: Decimal, quantity: Decimal) -> Option<OrderId> {
        let order = Order {
            id: self.registry.allocate_id(),
            side,
            price,
            quantity,
        };

        if order.price <= Decimal::ZERO {
            debug!(id = order.id, %price, "submit rejected: non-positive price");
            self.listener.on_reject(&order, RejectReason::NonPositivePrice);
            return None;
        }
        if order.quantity <= Decimal::ZERO {
            debug!(id = order.id, %quantity, "submit rejected: non-positive quantity");
            self.listener.on_reject(&order, RejectReason::NonPositiveQuantity);
            return None;
        }

        Some(self.execute(order))
    }

    /// Cancel a resting order.
    ///
    /// # Returns
    /// `true` and fires the cancel event on success; `false` with no event
    /// if the id is not resting.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        let Some(loc) = self.registry.get(id) else {
            return false;
        };

        let book = side_mut(&mut self.bids, &mut self.asks, loc.side);
        let Some(level) = book.level_mut(loc.price) else {
            return false;
        };
        if level.remove(id).is_none() {
            return false;
        }
        if level.is_empty() {
            book.delete_level(loc.price);
        }

        self.registry.remove(id);
        debug!(id, "order cancelled");
        self.listener.on_cancel(id);
        true
    }

    /// Amend a resting order's quantity and/or price.
    ///
    /// The order is detached from its level first; the detach is definitive.
    /// A new quantity of zero or less acts as a cancel. A new price of zero
    /// or less is rejected and the order does not return to the book. Any
    /// other edit re-submits the order under its original id, which resets
    /// its time priority (it rejoins at the tail of whatever level it lands
    /// in) and may cross immediately.
    ///
    /// # Returns
    /// `false` with no event if the id is not resting, `false` after a
    /// reject event for an invalid new price, `true` otherwise.
    pub fn amend(
        &mut self,
        id: OrderId,
        new_quantity: Option<Decimal>,
        new_price: Option<Decimal>,
    ) -> bool {
        let Some(loc) = self.registry.get(id) else {
            return false;
        };

        // Detach from the current level and the registry.
        let book = side_mut(&mut self.bids, &mut self.asks, loc.side);
        let Some(level) = book.level_mut(loc.price) else {
            return false;
        };
        let Some(mut order) = level.remove(id) else {
            return false;
        };
        if level.is_empty() {
            book.delete_level(loc.price);
        }
        self.registry.remove(id);

        if let Some(quantity) = new_quantity {
            if quantity <= Decimal::ZERO {
                debug!(id, "amend to non-positive quantity treated as cancel");
                self.listener.on_cancel(id);
                return true;
            }
            order.quantity = quantity;
        }
        if let Some(price) = new_price {
            if price <= Decimal::ZERO {
                debug!(id, %price, "amend rejected: non-positive new price");
                self.listener.on_reject(&order, RejectReason::NonPositiveAmendPrice);
                return false;
            }
            order.price = price;
        }

        debug!(id, %order.price, %order.quantity, "amended order re-enters the book");
        self.execute(order);
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Best bid and best ask; either is absent when that side is empty.
    pub fn top_of_book(&self) -> (Option<Decimal>, Option<Decimal>) {
        (self.bids.best_price(), self.asks.best_price())
    }

    /// A side's levels as `(price, aggregate_quantity)`, best first.
    pub fn depth(&self, side: Side) -> Vec<(Decimal, Decimal)> {
        self.book(side).depth()
    }

    /// Best bid price
    #[inline]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    /// Best ask price
    #[inline]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    /// Best-ask minus best-bid, when both sides are populated.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.bids.best_price(), self.asks.best_price()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Number of resting orders across both sides
    pub fn order_count(&self) -> usize {
        self.registry.len()
    }

    /// True when nothing rests on either side
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// The registered listener
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Mutable access to the registered listener
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    // ========================================================================
    // Crossing and resting
    // ========================================================================

    /// Run a validated order through accept, cross, rest.
    ///
    /// Also the amend resubmission path: the order keeps its original id but
    /// is otherwise treated as a fresh arrival.
    fn execute(&mut self, mut order: Order) -> OrderId {
        self.listener.on_accept(&order);

        loop {
            if order.quantity <= Decimal::ZERO {
                break;
            }
            let Some(best) = self.book(order.side.opposite()).best_price() else {
                break;
            };
            let crosses = match order.side {
                Side::Buy => best <= order.price,
                Side::Sell => best >= order.price,
            };
            if !crosses {
                break;
            }
            if !self.consume_level(best, &mut order) {
                break;
            }
        }

        if order.quantity > Decimal::ZERO {
            self.rest(order);
        }
        order.id
    }

    /// Match the taker against the opposite level at `price`, head first,
    /// until the taker is filled or the level is exhausted. Fully filled
    /// makers leave the level and the registry immediately; an emptied level
    /// leaves the book before the next best price is consulted.
    ///
    /// # Returns
    /// Whether any quantity traded (guards the outer loop against spinning).
    fn consume_level(&mut self, price: Decimal, taker: &mut Order) -> bool {
        let maker_side = taker.side.opposite();
        let mut traded_any = false;

        loop {
            if taker.quantity <= Decimal::ZERO {
                break;
            }
            let book = side_mut(&mut self.bids, &mut self.asks, maker_side);
            let Some(level) = book.level_mut(price) else {
                break;
            };
            let Some(maker) = level.peek_mut() else {
                break;
            };

            let traded = taker.quantity.min(maker.quantity);
            taker.quantity -= traded;
            maker.quantity -= traded;
            let maker_id = maker.id;
            let maker_filled = maker.quantity == Decimal::ZERO;

            if maker_filled {
                level.pop();
            }
            let exhausted = level.is_empty();
            if exhausted {
                book.delete_level(price);
            }
            if maker_filled {
                self.registry.remove(maker_id);
            }

            let trade = Trade {
                taker_order_id: taker.id,
                maker_order_id: maker_id,
                price,
                quantity: traded,
            };
            trace!(
                taker = trade.taker_order_id,
                maker = trade.maker_order_id,
                %price,
                quantity = %trade.quantity,
                "trade"
            );
            self.listener.on_trade(&trade);
            traded_any = true;

            if exhausted {
                break;
            }
        }

        traded_any
    }

    /// Rest an unfilled remainder on its own side and index it.
    fn rest(&mut self, order: Order) {
        let (id, price, side) = (order.id, order.price, order.side);
        side_mut(&mut self.bids, &mut self.asks, side).insert(order);
        self.registry.insert(id, price, side);
        trace!(id, ?side, %price, "order resting");
    }

    #[inline]
    fn book(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }
}

/// Free-function side selector so callers can keep disjoint borrows of the
/// registry and listener alive alongside the chosen book.
#[inline]
fn side_mut<'a>(bids: &'a mut BookSide, asks: &'a mut BookSide, side: Side) -> &'a mut BookSide {
    match side {
        Side::Buy => bids,
        Side::Sell => asks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use rust_decimal_macros::dec;

    fn engine() -> MatchingEngine<EventLog> {
        MatchingEngine::with_listener(EventLog::new())
    }

    #[test]
    fn test_submit_rests_bid() {
        let mut eng = engine();
        let id = eng.submit(Side::Buy, dec!(100), dec!(10)).unwrap();

        assert_eq!(eng.best_bid(), Some(dec!(100)));
        assert_eq!(eng.best_ask(), None);
        assert_eq!(eng.order_count(), 1);
        assert_eq!(eng.listener().accepted.len(), 1);
        assert_eq!(eng.listener().accepted[0].id, id);
    }

    #[test]
    fn test_reject_non_positive_price() {
        let mut eng = engine();
        assert_eq!(eng.submit(Side::Buy, dec!(0), dec!(10)), None);
        assert_eq!(eng.submit(Side::Sell, dec!(-1), dec!(10)), None);

        assert!(eng.is_empty());
        assert!(eng.listener().accepted.is_empty());
        assert_eq!(eng.listener().rejected.len(), 2);
        assert_eq!(
            eng.listener().rejected[0].1,
            RejectReason::NonPositivePrice
        );
    }

    #[test]
    fn test_reject_non_positive_quantity() {
        let mut eng = engine();
        assert_eq!(eng.submit(Side::Buy, dec!(100), dec!(0)), None);

        assert!(eng.is_empty());
        assert_eq!(
            eng.listener().rejected[0].1,
            RejectReason::NonPositiveQuantity
        );
    }

    #[test]
    fn test_full_match_at_maker_price() {
        let mut eng = engine();
        let maker = eng.submit(Side::Sell, dec!(100), dec!(10)).unwrap();
        let taker = eng.submit(Side::Buy, dec!(101), dec!(10)).unwrap();

        let trades = &eng.listener().trades;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, maker);
        assert_eq!(trades[0].taker_order_id, taker);
        assert_eq!(trades[0].price, dec!(100)); // maker's price, not 101
        assert_eq!(trades[0].quantity, dec!(10));

        assert!(eng.is_empty());
        assert_eq!(eng.top_of_book(), (None, None));
    }

    #[test]
    fn test_partial_fill_maker_remains() {
        let mut eng = engine();
        eng.submit(Side::Sell, dec!(100), dec!(10)).unwrap();
        eng.submit(Side::Buy, dec!(100), dec!(4)).unwrap();

        assert_eq!(eng.order_count(), 1);
        assert_eq!(eng.depth(Side::Sell), vec![(dec!(100), dec!(6))]);
    }

    #[test]
    fn test_partial_fill_taker_rests_remainder() {
        let mut eng = engine();
        eng.submit(Side::Sell, dec!(100), dec!(4)).unwrap();
        let taker = eng.submit(Side::Buy, dec!(100), dec!(10)).unwrap();

        assert_eq!(eng.order_count(), 1);
        assert_eq!(eng.depth(Side::Buy), vec![(dec!(100), dec!(6))]);
        assert_eq!(eng.listener().trades[0].taker_order_id, taker);
    }

    #[test]
    fn test_crossing_walks_price_levels_best_first() {
        let mut eng = engine();
        eng.submit(Side::Sell, dec!(102), dec!(5)).unwrap();
        eng.submit(Side::Sell, dec!(100), dec!(5)).unwrap();
        eng.submit(Side::Sell, dec!(101), dec!(5)).unwrap();

        eng.submit(Side::Buy, dec!(102), dec!(12)).unwrap();

        let prices: Vec<_> = eng.listener().trades.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![dec!(100), dec!(101), dec!(102)]);
        assert_eq!(eng.depth(Side::Sell), vec![(dec!(102), dec!(3))]);
    }

    #[test]
    fn test_no_cross_when_prices_do_not_overlap() {
        let mut eng = engine();
        eng.submit(Side::Buy, dec!(99), dec!(10)).unwrap();
        eng.submit(Side::Sell, dec!(101), dec!(10)).unwrap();

        assert!(eng.listener().trades.is_empty());
        assert_eq!(eng.top_of_book(), (Some(dec!(99)), Some(dec!(101))));
        assert_eq!(eng.spread(), Some(dec!(2)));
    }

    #[test]
    fn test_cancel_unknown_id() {
        let mut eng = engine();
        assert!(!eng.cancel(999));
        assert!(eng.listener().cancelled.is_empty());
    }

    #[test]
    fn test_cancel_removes_order_and_level() {
        let mut eng = engine();
        let id = eng.submit(Side::Buy, dec!(99), dec!(50)).unwrap();

        assert!(eng.cancel(id));
        assert!(eng.is_empty());
        assert_eq!(eng.best_bid(), None);
        assert_eq!(eng.listener().cancelled, vec![id]);
    }

    #[test]
    fn test_amend_unknown_id() {
        let mut eng = engine();
        assert!(!eng.amend(7, Some(dec!(5)), None));
    }

    #[test]
    fn test_amend_to_zero_quantity_cancels() {
        let mut eng = engine();
        let id = eng.submit(Side::Buy, dec!(99), dec!(50)).unwrap();

        assert!(eng.amend(id, Some(dec!(0)), None));
        assert!(eng.is_empty());
        assert_eq!(eng.listener().cancelled, vec![id]);
    }

    #[test]
    fn test_amend_invalid_price_is_definitive_removal() {
        let mut eng = engine();
        let id = eng.submit(Side::Buy, dec!(99), dec!(50)).unwrap();

        assert!(!eng.amend(id, None, Some(dec!(-1))));
        // The order does not revert; it is gone.
        assert!(eng.is_empty());
        assert_eq!(
            eng.listener().rejected[0].1,
            RejectReason::NonPositiveAmendPrice
        );
        // And the id no longer resolves.
        assert!(!eng.cancel(id));
    }

    #[test]
    fn test_amend_can_cross_immediately() {
        let mut eng = engine();
        let buy = eng.submit(Side::Buy, dec!(99), dec!(10)).unwrap();
        let sell = eng.submit(Side::Sell, dec!(101), dec!(10)).unwrap();

        assert!(eng.amend(buy, None, Some(dec!(101))));

        let trades = &eng.listener().trades;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].taker_order_id, buy);
        assert_eq!(trades[0].maker_order_id, sell);
        assert_eq!(trades[0].price, dec!(101));
        assert!(eng.is_empty());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut eng = engine();
        let a = eng.submit(Side::Buy, dec!(99), dec!(10)).unwrap();
        assert!(eng.cancel(a));

        // A rejected submission still consumes an id.
        assert_eq!(eng.submit(Side::Buy, dec!(0), dec!(1)), None);

        let b = eng.submit(Side::Buy, dec!(99), dec!(10)).unwrap();
        assert!(b > a + 1);

        // Amend keeps the original id; the next fresh submission still moves on.
        assert!(eng.amend(b, Some(dec!(20)), None));
        let c = eng.submit(Side::Sell, dec!(200), dec!(1)).unwrap();
        assert!(c > b);
    }
}
