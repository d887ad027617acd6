//! Market maker - maintains a two-sided quote around the midpoint.

use rand::{Rng, RngCore};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::order::{NewOrder, OrderId, Side};

use super::{Strategy, TopOfBook};

/// Active quote state: id plus the price and size it went out at.
type Quote = (OrderId, Decimal, Decimal);

/// Two-sided quoting strategy.
///
/// Quotes one side per tick until both a bid and an ask rest in the book.
/// When the midpoint moves by `refresh_abs` or more, the stranded quotes are
/// surfaced through `stale_quotes` for cancellation and rebuilt on the
/// following ticks. Sizing shrinks toward zero as inventory approaches
/// `inv_limit` on either side, with a small random jitter.
pub struct MarketMaker {
    trader_id: String,
    /// Minimum price increment; also the floor for quoted prices
    tick: Decimal,
    /// Absolute half-spread around the midpoint
    offset: Decimal,
    base_size: f64,
    /// Relative size jitter (0.2 = plus or minus 20%)
    size_jitter: f64,
    inv_limit: f64,
    target_inventory: f64,
    /// Re-quote when the mid moves at least this far
    refresh_abs: Decimal,

    cash: Decimal,
    inventory: Decimal,
    active_bid: Option<Quote>,
    active_ask: Option<Quote>,
    want_bid: bool,
    last_mid: Option<Decimal>,
    needs_refresh: bool,
}

impl MarketMaker {
    pub fn new(trader_id: impl Into<String>) -> Self {
        Self {
            trader_id: trader_id.into(),
            tick: Decimal::new(1, 2),   // 0.01
            offset: Decimal::new(50, 2), // 0.50
            base_size: 5.0,
            size_jitter: 0.2,
            inv_limit: 100.0,
            target_inventory: 0.0,
            refresh_abs: Decimal::new(50, 2),
            cash: Decimal::ZERO,
            inventory: Decimal::ZERO,
            active_bid: None,
            active_ask: None,
            want_bid: true,
            last_mid: None,
            needs_refresh: false,
        }
    }

    pub fn with_offset(mut self, offset: Decimal) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_base_size(mut self, base_size: f64) -> Self {
        self.base_size = base_size;
        self
    }

    pub fn with_refresh_abs(mut self, refresh_abs: Decimal) -> Self {
        self.refresh_abs = refresh_abs;
        self
    }

    pub fn with_inventory_limit(mut self, inv_limit: f64) -> Self {
        self.inv_limit = inv_limit;
        self
    }

    /// Units currently held
    pub fn inventory(&self) -> Decimal {
        self.inventory
    }

    /// Cash balance from fills
    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Bid and ask prices at the configured offset, clamped positive and
    /// forced to a minimal spread when they would collapse.
    fn quote_prices(&self, mid: Decimal) -> (Decimal, Decimal) {
        let off = self.offset.max(self.tick);
        let bid = (mid - off).max(self.tick);
        let mut ask = (mid + off).max(self.tick);
        if bid >= ask {
            ask = bid + self.tick;
        }
        (bid, ask)
    }

    /// Inventory-aware size for one side. Shrinks buys as inventory grows
    /// long and sells as it grows short; zero at the limit.
    fn size_for(&self, rng: &mut dyn RngCore, side: Side) -> Decimal {
        let inv = self.inventory.to_f64().unwrap_or(0.0) - self.target_inventory;
        let limit = self.inv_limit.max(1e-9);
        let pressure = (inv / limit).clamp(-1.0, 1.0);

        let scale = match side {
            Side::Buy => {
                if inv >= limit {
                    0.0
                } else {
                    (1.0 - pressure.max(0.0)).max(0.0)
                }
            }
            Side::Sell => {
                if -inv >= limit {
                    0.0
                } else {
                    (1.0 + pressure.min(0.0)).max(0.0)
                }
            }
        };

        let size = self.base_size * scale;
        if size <= 0.0 {
            return Decimal::ZERO;
        }

        let jitter = (1.0 + self.size_jitter * rng.gen_range(-1.0..=1.0)).max(0.0);
        let size = Decimal::from_f64(size * jitter)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        // Rounding must not zero out a live quote
        size.max(self.tick)
    }
}

impl Strategy for MarketMaker {
    fn trader_id(&self) -> &str {
        &self.trader_id
    }

    fn should_trade(&mut self, _rng: &mut dyn RngCore, _delta_t: f64) -> bool {
        true
    }

    fn stale_quotes(&mut self, mid_price: Decimal) -> Vec<OrderId> {
        let mut stale = Vec::new();
        if let Some(last) = self.last_mid {
            if (mid_price - last).abs() >= self.refresh_abs {
                stale.extend(self.active_bid.take().map(|(id, _, _)| id));
                stale.extend(self.active_ask.take().map(|(id, _, _)| id));
                self.needs_refresh = true;
            }
        }
        self.last_mid = Some(mid_price);
        stale
    }

    fn generate_order(
        &mut self,
        rng: &mut dyn RngCore,
        mid_price: Decimal,
        _top: TopOfBook,
    ) -> Option<NewOrder> {
        if mid_price <= Decimal::ZERO {
            return None;
        }
        if !self.needs_refresh && self.active_bid.is_some() && self.active_ask.is_some() {
            return None;
        }

        // Quote the risk-reducing side first when rebuilding from scratch:
        // long inventory quotes the ask first, short quotes the bid first.
        if self.active_bid.is_none() && self.active_ask.is_none() {
            let inv = self.inventory.to_f64().unwrap_or(0.0);
            self.want_bid = inv <= self.target_inventory;
        }

        let (bid_price, ask_price) = self.quote_prices(mid_price);

        if self.active_bid.is_none() && (self.want_bid || self.active_ask.is_some()) {
            self.want_bid = false;
            let quantity = self.size_for(rng, Side::Buy);
            if quantity > Decimal::ZERO {
                return Some(NewOrder {
                    side: Side::Buy,
                    price: bid_price,
                    quantity,
                });
            }
        }

        if self.active_ask.is_none() {
            self.want_bid = true;
            let quantity = self.size_for(rng, Side::Sell);
            if quantity > Decimal::ZERO {
                return Some(NewOrder {
                    side: Side::Sell,
                    price: ask_price,
                    quantity,
                });
            }
        }

        self.needs_refresh = false;
        None
    }

    fn order_submitted(&mut self, id: OrderId, order: &NewOrder) {
        let quote = Some((id, order.price, order.quantity));
        match order.side {
            Side::Buy => self.active_bid = quote,
            Side::Sell => self.active_ask = quote,
        }
        if self.active_bid.is_some() && self.active_ask.is_some() {
            self.needs_refresh = false;
        }
    }

    fn on_fill(&mut self, side: Side, price: Decimal, quantity: Decimal) {
        match side {
            Side::Buy => {
                self.inventory += quantity;
                self.cash -= price * quantity;
            }
            Side::Sell => {
                self.inventory -= quantity;
                self.cash += price * quantity;
            }
        }
    }

    fn on_cancel(&mut self, id: OrderId) {
        if self.active_bid.map_or(false, |(bid_id, _, _)| bid_id == id) {
            self.active_bid = None;
        }
        if self.active_ask.map_or(false, |(ask_id, _, _)| ask_id == id) {
            self.active_ask = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quotes_both_sides_across_ticks() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut mm = MarketMaker::new("mm");

        let first = mm
            .generate_order(&mut rng, dec!(100), (None, None))
            .unwrap();
        mm.order_submitted(1, &first);
        let second = mm
            .generate_order(&mut rng, dec!(100), (None, None))
            .unwrap();
        mm.order_submitted(2, &second);

        assert_ne!(first.side, second.side);
        let (bid, ask) = if first.side == Side::Buy {
            (first, second)
        } else {
            (second, first)
        };
        assert_eq!(bid.price, dec!(99.50));
        assert_eq!(ask.price, dec!(100.50));

        // Both sides live, no refresh pending: nothing more to do.
        assert!(mm
            .generate_order(&mut rng, dec!(100), (None, None))
            .is_none());
    }

    #[test]
    fn test_refresh_after_mid_move() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut mm = MarketMaker::new("mm").with_refresh_abs(dec!(0.50));

        assert!(mm.stale_quotes(dec!(100)).is_empty()); // first observation
        let bid = mm
            .generate_order(&mut rng, dec!(100), (None, None))
            .unwrap();
        mm.order_submitted(1, &bid);
        let ask = mm
            .generate_order(&mut rng, dec!(100), (None, None))
            .unwrap();
        mm.order_submitted(2, &ask);

        // Small move: quotes stand.
        assert!(mm.stale_quotes(dec!(100.2)).is_empty());

        // Big move: both quotes come back for cancellation.
        let mut stale = mm.stale_quotes(dec!(101));
        stale.sort_unstable();
        assert_eq!(stale, vec![1, 2]);

        // And the maker re-quotes around the new mid.
        let requote = mm
            .generate_order(&mut rng, dec!(101), (None, None))
            .unwrap();
        assert!(requote.price >= dec!(100.50));
    }

    #[test]
    fn test_inventory_moves_with_fills() {
        let mut mm = MarketMaker::new("mm");
        mm.on_fill(Side::Buy, dec!(99.50), dec!(5));
        assert_eq!(mm.inventory(), dec!(5));
        assert_eq!(mm.cash(), dec!(-497.50));

        mm.on_fill(Side::Sell, dec!(100.50), dec!(5));
        assert_eq!(mm.inventory(), dec!(0));
        assert_eq!(mm.cash(), dec!(5.00));
    }

    #[test]
    fn test_sizing_stops_at_inventory_limit() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut mm = MarketMaker::new("mm").with_inventory_limit(10.0);
        mm.on_fill(Side::Buy, dec!(100), dec!(10)); // at the long limit

        assert_eq!(mm.size_for(&mut rng, Side::Buy), Decimal::ZERO);
        assert!(mm.size_for(&mut rng, Side::Sell) > Decimal::ZERO);
    }

    #[test]
    fn test_long_inventory_quotes_ask_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut mm = MarketMaker::new("mm");
        mm.on_fill(Side::Buy, dec!(100), dec!(20));

        let first = mm
            .generate_order(&mut rng, dec!(100), (None, None))
            .unwrap();
        assert_eq!(first.side, Side::Sell);
    }
}
