//! # Matchbook
//!
//! A price-time priority limit order matching engine with an agent-based
//! simulation harness on top.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: every operation takes `&mut self` and runs to
//!   completion; no internal locking, no suspension points
//! - **Price-Time Priority**: best price first, earliest arrival first
//!   within a price, trades always at the maker's resting price
//! - **Exact Arithmetic**: decimal prices and quantities, so conservation
//!   holds to the last digit
//! - **Deterministic**: all randomness lives in the simulation layer behind
//!   an explicitly seeded RNG
//!
//! ## Architecture
//!
//! ```text
//! [Strategies] --> [Simulation Driver] --> [Matching Engine]
//!                                               |
//!                                     [EventListener channels]
//! ```

pub mod agents;
pub mod book_side;
pub mod engine;
pub mod events;
pub mod order;
pub mod price_level;
pub mod registry;
pub mod sim;

// Re-exports for convenience
pub use agents::{InformedTrader, MarketMaker, NoiseTrader, Strategy, TopOfBook};
pub use book_side::BookSide;
pub use engine::MatchingEngine;
pub use events::{EventListener, EventLog, NullListener, RejectReason, Trade};
pub use order::{NewOrder, Order, OrderId, Side};
pub use price_level::PriceLevel;
pub use registry::{OrderRegistry, RestingLocation};
pub use sim::{SimConfig, SimSummary, Simulation};
