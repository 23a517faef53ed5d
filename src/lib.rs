//! # microlob
//!
//! A deterministic, microsecond-scale limit order book matching engine
//! for a single instrument.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: the matching thread owns the book exclusively
//!   (no locks anywhere on the hot path)
//! - **Zero Steady-State Allocation**: orders and price levels live in
//!   pools pre-allocated at startup; linkage is intrusive `u32` indices
//! - **Price-Time Priority**: a red-black tree orders the levels, a
//!   FIFO queue orders each level, a hash map jumps straight to a price
//! - **Event Sourcing**: the book state is a pure function of the
//!   totally ordered command stream, so replays reproduce it exactly
//!
//! ## Architecture
//!
//! ```text
//! [I/O Thread] --> [SPSC Ring Buffer] --> [Matching Thread (Pinned)]
//!                                                 |
//!                                          [Egress Events]
//! ```

pub mod book;
pub mod command;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod matching;
pub mod order;
pub mod pool;
pub mod price_level;
pub mod ring;
pub mod tree;

// Re-exports for convenience
pub use book::OrderBook;
pub use command::{Command, Side};
pub use engine::{Engine, WARMUP_ITERATIONS};
pub use error::FrameError;
pub use events::{Accepted, EventLog, EventSink, MatchEvent, NullSink, Rejected, Trade};
pub use frame::{
    ExecReportFrame, ExecReportFrameMut, ExecStatus, OrderFrame, OrderFrameMut, EXEC_REPORT_LEN,
    ORDER_FRAME_LEN,
};
pub use matching::{MatchingEngine, LEVEL_POOL_CAPACITY, ORDER_POOL_CAPACITY};
pub use pool::{LevelIndex, OrderIndex, Pool, Poolable, NULL_INDEX};
pub use price_level::PriceLevel;
pub use tree::PriceTree;

/// Command ring capacity used by the composition root.
pub const RING_CAPACITY: usize = 65_536;
