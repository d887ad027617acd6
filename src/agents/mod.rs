//! Trading agents - the strategies that decide when and what to submit.
//!
//! Strategies carry no algorithmic risk; they are policy glue around the
//! engine. Every stochastic decision receives an explicit RNG so simulation
//! runs are reproducible from a seed.

mod informed;
mod maker;
mod noise;

pub use informed::InformedTrader;
pub use maker::MarketMaker;
pub use noise::NoiseTrader;

use rand::RngCore;
use rust_decimal::Decimal;

use crate::order::{NewOrder, OrderId, Side};

/// Best bid and best ask as seen by a strategy.
pub type TopOfBook = (Option<Decimal>, Option<Decimal>);

/// A trading strategy polled by the simulation driver.
///
/// Per tick the driver asks `should_trade`, then `generate_order` at most
/// once. The bookkeeping hooks default to no-ops; implementations that track
/// open orders or inventory override the ones they need.
pub trait Strategy {
    /// Identifier for logs and attribution
    fn trader_id(&self) -> &str;

    /// Decide whether to act during a tick of length `delta_t`.
    fn should_trade(&mut self, rng: &mut dyn RngCore, delta_t: f64) -> bool;

    /// Produce the next order, or `None` to sit out this tick.
    fn generate_order(
        &mut self,
        rng: &mut dyn RngCore,
        mid_price: Decimal,
        top: TopOfBook,
    ) -> Option<NewOrder>;

    /// Resting orders this strategy wants cancelled before it is polled.
    /// The market maker uses this to pull quotes stranded by a mid move.
    fn stale_quotes(&mut self, mid_price: Decimal) -> Vec<OrderId> {
        let _ = mid_price;
        Vec::new()
    }

    /// The engine accepted the strategy's latest order under `id`.
    fn order_submitted(&mut self, id: OrderId, order: &NewOrder) {
        let _ = (id, order);
    }

    /// One of this strategy's orders traded. `side` is the strategy's own
    /// side of the fill.
    fn on_fill(&mut self, side: Side, price: Decimal, quantity: Decimal) {
        let _ = (side, price, quantity);
    }

    /// One of this strategy's orders was cancelled.
    fn on_cancel(&mut self, id: OrderId) {
        let _ = id;
    }
}
