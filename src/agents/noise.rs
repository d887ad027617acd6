//! Noise trader - uninformed random flow around the midpoint.

use rand::{Rng, RngCore};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::order::{NewOrder, Side};

use super::{Strategy, TopOfBook};

/// Places random buy/sell limit orders driven by a Poisson arrival process.
///
/// Prices are perturbed by up to `price_vol` (a fraction of the midpoint) in
/// either direction; quantities are drawn uniformly from `quantity_range`.
/// Both are rounded to two decimal places.
pub struct NoiseTrader {
    trader_id: String,
    /// Expected arrivals per unit time
    lambda_rate: f64,
    /// Max relative deviation from the midpoint
    price_vol: f64,
    quantity_range: (f64, f64),
}

impl NoiseTrader {
    pub fn new(
        trader_id: impl Into<String>,
        lambda_rate: f64,
        price_vol: f64,
        quantity_range: (f64, f64),
    ) -> Self {
        Self {
            trader_id: trader_id.into(),
            lambda_rate,
            price_vol,
            quantity_range,
        }
    }
}

impl Strategy for NoiseTrader {
    fn trader_id(&self) -> &str {
        &self.trader_id
    }

    /// P(arrival in delta_t) = 1 - exp(-lambda * delta_t)
    fn should_trade(&mut self, rng: &mut dyn RngCore, delta_t: f64) -> bool {
        let p_trade = 1.0 - (-self.lambda_rate * delta_t).exp();
        rng.gen::<f64>() < p_trade
    }

    fn generate_order(
        &mut self,
        rng: &mut dyn RngCore,
        mid_price: Decimal,
        _top: TopOfBook,
    ) -> Option<NewOrder> {
        let mid = mid_price.to_f64()?;
        if mid <= 0.0 {
            return None;
        }

        let side = if rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };

        let deviation = 1.0 + rng.gen_range(-self.price_vol..=self.price_vol);
        let price = Decimal::from_f64(mid * deviation)?.round_dp(2);

        let (lo, hi) = self.quantity_range;
        let quantity = Decimal::from_f64(rng.gen_range(lo..=hi))?.round_dp(2);

        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return None;
        }

        Some(NewOrder {
            side,
            price,
            quantity,
        })
    }
}
