//! Event channels emitted by the matching engine.
//!
//! Listeners are invoked synchronously, inline, before the triggering call
//! returns. They receive read-only views of engine data; because every engine
//! operation takes `&mut self`, a listener cannot call back into the same
//! engine instance mid-operation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{Order, OrderId};

/// An executed match. Price is always the maker's resting price: the aggressor
/// gets the resting price, never its own limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Aggressing (incoming) order id
    pub taker_order_id: OrderId,
    /// Resting order id
    pub maker_order_id: OrderId,
    /// Execution price (the maker's price)
    pub price: Decimal,
    /// Executed quantity, always positive
    pub quantity: Decimal,
}

/// Why a submit or amend was refused. `Display` renders the reason text
/// surfaced through [`EventListener::on_reject`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("price must be positive")]
    NonPositivePrice,
    #[error("quantity must be positive")]
    NonPositiveQuantity,
    #[error("new price must be positive")]
    NonPositiveAmendPrice,
}

/// The four notification channels of the engine. All methods default to no-ops
/// so consumers implement only what they care about.
pub trait EventListener {
    /// A trade executed during submit or amend-resubmission.
    fn on_trade(&mut self, trade: &Trade) {
        let _ = trade;
    }

    /// An order passed validation. Fires before any crossing it causes.
    fn on_accept(&mut self, order: &Order) {
        let _ = order;
    }

    /// A resting order was removed by cancel (or an amend down to zero).
    fn on_cancel(&mut self, order_id: OrderId) {
        let _ = order_id;
    }

    /// An order failed validation. No state was mutated for it.
    fn on_reject(&mut self, order: &Order, reason: RejectReason) {
        let _ = (order, reason);
    }
}

/// Listener that discards everything. The engine default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListener;

impl EventListener for NullListener {}

/// Listener that records every event, in order within each channel.
///
/// Used by the simulation driver for statistics and by tests for assertions.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pub trades: Vec<Trade>,
    pub accepted: Vec<Order>,
    pub cancelled: Vec<OrderId>,
    pub rejected: Vec<(Order, RejectReason)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total quantity across all recorded trades.
    pub fn traded_volume(&self) -> Decimal {
        self.trades.iter().map(|t| t.quantity).sum()
    }

    pub fn clear(&mut self) {
        self.trades.clear();
        self.accepted.clear();
        self.cancelled.clear();
        self.rejected.clear();
    }
}

impl EventListener for EventLog {
    fn on_trade(&mut self, trade: &Trade) {
        self.trades.push(*trade);
    }

    fn on_accept(&mut self, order: &Order) {
        self.accepted.push(*order);
    }

    fn on_cancel(&mut self, order_id: OrderId) {
        self.cancelled.push(order_id);
    }

    fn on_reject(&mut self, order: &Order, reason: RejectReason) {
        self.rejected.push((*order, reason));
    }
}
