//! Matching Engine - the single-writer state machine at the core.
//!
//! One command in, zero or more events out:
//! 1. CROSS: match the incoming order against the opposite side while
//!    its limit price crosses the best resting level.
//! 2. REST: if quantity remains, park the residual in the book and
//!    acknowledge it. A fully-filled order emits only its fills.
//!
//! The engine owns the order and level pools outright, so after startup
//! the hot path performs no heap allocation. Everything here runs on the
//! matching thread; the input stream's total order makes the book state
//! a pure function of that stream.

use crate::book::OrderBook;
use crate::command::Side;
use crate::events::EventSink;
use crate::order::Order;
use crate::pool::Pool;
use crate::price_level::PriceLevel;

/// Default capacity of the order pool: peak open orders.
pub const ORDER_POOL_CAPACITY: u32 = 1 << 20;

/// Default capacity of the level pool: peak active price levels.
pub const LEVEL_POOL_CAPACITY: u32 = 1024;

/// The matching engine core for one instrument.
pub struct MatchingEngine {
    orders: Pool<Order>,
    levels: Pool<PriceLevel>,
    book: OrderBook,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    /// Engine with the production pool capacities.
    pub fn new() -> Self {
        Self::with_capacity(ORDER_POOL_CAPACITY, LEVEL_POOL_CAPACITY)
    }

    /// Engine with explicit pool capacities (tests, warm-up scratch).
    pub fn with_capacity(order_capacity: u32, level_capacity: u32) -> Self {
        Self {
            orders: Pool::with_capacity(order_capacity),
            levels: Pool::with_capacity(level_capacity),
            book: OrderBook::new(),
        }
    }

    /// Process one order command to completion.
    ///
    /// Pre: `qty > 0` and `price > 0` - enforced by the gateway; here
    /// they are programming errors.
    ///
    /// Emits, in order: a passive and an aggressor fill per slice, then
    /// a single accept if a residual rests. Orders that fill completely
    /// on entry are never acknowledged.
    pub fn accept_order<S: EventSink>(
        &mut self,
        id: i64,
        price: i64,
        qty: i64,
        side: Side,
        sink: &mut S,
    ) {
        debug_assert!(qty > 0, "non-positive quantity reached the engine");
        debug_assert!(price > 0, "non-positive price reached the engine");

        let filled = self
            .book
            .match_order(&mut self.orders, &mut self.levels, id, price, qty, side, sink);

        let remaining = qty - filled;
        if remaining > 0 {
            self.book
                .add_order(&mut self.orders, &mut self.levels, id, price, remaining, side);
            sink.on_accepted(id, price, remaining, side);
        }
    }

    /// Highest resting buy price.
    #[inline]
    pub fn best_bid(&self) -> Option<i64> {
        self.book.best_bid(&self.levels)
    }

    /// Lowest resting sell price.
    #[inline]
    pub fn best_ask(&self) -> Option<i64> {
        self.book.best_ask(&self.levels)
    }

    /// Total resting quantity at a price.
    #[inline]
    pub fn depth_at(&self, side: Side, price: i64) -> i64 {
        self.book.depth_at(&self.levels, side, price)
    }

    /// Number of orders currently resting in the book.
    #[inline]
    pub fn open_orders(&self) -> u32 {
        self.orders.in_use()
    }

    /// Number of live price levels across both sides.
    #[inline]
    pub fn active_levels(&self) -> u32 {
        self.levels.in_use()
    }

    /// Free slots left in the order pool.
    #[inline]
    pub fn order_pool_available(&self) -> u32 {
        self.orders.available()
    }

    /// Free slots left in the level pool.
    #[inline]
    pub fn level_pool_available(&self) -> u32 {
        self.levels.available()
    }

    /// Pre-fault the pools' backing pages.
    pub fn warm_up_pools(&mut self) {
        self.orders.warm_up();
        self.levels.warm_up();
    }

    /// Check every book/tree/pool structural invariant. Debug facility
    /// for tests and fuzz runs.
    pub fn validate(&self) {
        self.book.validate(&self.orders, &self.levels);
    }
}
