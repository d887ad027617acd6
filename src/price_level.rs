//! Price Level - a FIFO queue of orders at a single price point.
//!
//! Arrival order is match order (time priority): the head is always the oldest
//! order at the price and the first to be served.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::order::{Order, OrderId};

/// A queue of orders resting at one exact price.
///
/// A level that reports empty must be dropped from its book side immediately
/// by the caller; an empty level never remains indexed.
#[derive(Clone, Debug, Default)]
pub struct PriceLevel {
    orders: VecDeque<Order>,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
        }
    }

    /// Returns true if there are no orders at this level
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of orders at this level
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Append an order at the tail (newest, lowest priority).
    #[inline]
    pub fn add(&mut self, order: Order) {
        self.orders.push_back(order);
    }

    /// The head order (oldest, next to match), if any.
    #[inline]
    pub fn peek(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Mutable access to the head order, for partial-fill decrements.
    #[inline]
    pub fn peek_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    /// Remove and return the head order.
    #[inline]
    pub fn pop(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Remove the order with the given id, preserving the relative order of
    /// the rest.
    ///
    /// Linear scan. This is the dominant cost center if levels grow large; a
    /// secondary id-to-position index would make it O(1) at the cost of extra
    /// bookkeeping on every add and pop.
    pub fn remove(&mut self, id: OrderId) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == id)?;
        self.orders.remove(pos)
    }

    /// Sum of remaining quantities across all orders at this level.
    pub fn total_quantity(&self) -> Decimal {
        self.orders.iter().map(|o| o.quantity).sum()
    }

    /// Orders in priority order (head first).
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
