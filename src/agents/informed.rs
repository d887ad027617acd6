//! Informed trader - trades only on perceived mispricing against a private
//! value estimate, crossing the spread to get filled immediately.

use rand::{Rng, RngCore};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::order::{NewOrder, Side};

use super::{Strategy, TopOfBook};

/// Compares the midpoint against a private `true_value` and submits an
/// aggressive limit order when the gap exceeds `threshold`.
///
/// Buys are priced at the best ask and sells at the best bid so the order
/// crosses; when that side of the book is empty, the price falls back to the
/// midpoint plus or minus two percent. Size scales with the strength of the
/// signal.
pub struct InformedTrader {
    trader_id: String,
    true_value: Decimal,
    /// Scales signal strength into order size
    info_strength: f64,
    /// Minimum relative mispricing before acting
    threshold: f64,
    lambda_rate: f64,
    quantity_range: (f64, f64),
}

impl InformedTrader {
    pub fn new(
        trader_id: impl Into<String>,
        true_value: Decimal,
        info_strength: f64,
        threshold: f64,
        lambda_rate: f64,
        quantity_range: (f64, f64),
    ) -> Self {
        Self {
            trader_id: trader_id.into(),
            true_value,
            info_strength,
            threshold,
            lambda_rate,
            quantity_range,
        }
    }

    /// Update the private value estimate between ticks.
    pub fn set_true_value(&mut self, value: Decimal) {
        self.true_value = value;
    }
}

impl Strategy for InformedTrader {
    fn trader_id(&self) -> &str {
        &self.trader_id
    }

    fn should_trade(&mut self, rng: &mut dyn RngCore, delta_t: f64) -> bool {
        let p_info = 1.0 - (-self.lambda_rate * delta_t).exp();
        rng.gen::<f64>() < p_info
    }

    fn generate_order(
        &mut self,
        rng: &mut dyn RngCore,
        mid_price: Decimal,
        top: TopOfBook,
    ) -> Option<NewOrder> {
        let mid = mid_price.to_f64()?;
        if mid <= 0.0 {
            return None;
        }

        let mispricing = (self.true_value.to_f64()? - mid) / mid;
        if mispricing.abs() < self.threshold {
            return None;
        }

        let side = if mispricing > 0.0 {
            Side::Buy
        } else {
            Side::Sell
        };

        let size_factor = (mispricing.abs() * self.info_strength).min(1.0);
        let (lo, hi) = self.quantity_range;
        let quantity = Decimal::from_f64(rng.gen_range(lo..=hi) * size_factor)?.round_dp(2);
        if quantity <= Decimal::ZERO {
            return None;
        }

        let (best_bid, best_ask) = top;
        let price = match side {
            Side::Buy => match best_ask {
                Some(ask) => ask,
                None => Decimal::from_f64(mid * 1.02)?.round_dp(2),
            },
            Side::Sell => match best_bid {
                Some(bid) => bid,
                None => Decimal::from_f64(mid * 0.98)?.round_dp(2),
            },
        };
        if price <= Decimal::ZERO {
            return None;
        }

        Some(NewOrder {
            side,
            price,
            quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rust_decimal_macros::dec;

    fn trader(true_value: Decimal) -> InformedTrader {
        InformedTrader::new("informed", true_value, 50.0, 0.01, 0.3, (10.0, 100.0))
    }

    #[test]
    fn test_sits_out_when_fairly_priced() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut t = trader(dec!(100.5)); // 0.5% off, below 1% threshold
        assert!(t
            .generate_order(&mut rng, dec!(100), (Some(dec!(99)), Some(dec!(101))))
            .is_none());
    }

    #[test]
    fn test_buys_underpriced_at_best_ask() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut t = trader(dec!(110));
        let order = t
            .generate_order(&mut rng, dec!(100), (Some(dec!(99)), Some(dec!(101))))
            .unwrap();

        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.price, dec!(101)); // crosses at the ask
        assert!(order.quantity > Decimal::ZERO);
    }

    #[test]
    fn test_sells_overpriced_at_best_bid() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut t = trader(dec!(90));
        let order = t
            .generate_order(&mut rng, dec!(100), (Some(dec!(99)), Some(dec!(101))))
            .unwrap();

        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.price, dec!(99));
    }

    #[test]
    fn test_empty_book_falls_back_to_mid_offset() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut t = trader(dec!(110));
        let order = t
            .generate_order(&mut rng, dec!(100), (None, None))
            .unwrap();

        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.price, dec!(102));
    }
}
