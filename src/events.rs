//! Execution events emitted by the matching engine.
//!
//! The engine reports through an [`EventSink`] invoked synchronously on
//! the matching thread. Events for input *i* are fully emitted before any
//! event for input *i+1*; within one fill slice the passive (resting)
//! order's fill always precedes the aggressor's.

use crate::command::Side;

/// A fill slice for one order (either side of a trade).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trade {
    /// The subject order's ID
    pub order_id: i64,
    /// Execution price (always the resting level's price)
    pub price: i64,
    /// Executed quantity of this slice
    pub qty: i64,
    /// The subject order's original side
    pub side: Side,
}

/// An order rested in the book with the given residual quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accepted {
    pub order_id: i64,
    pub price: i64,
    /// Quantity left resting (original minus anything filled on entry)
    pub qty: i64,
    pub side: Side,
}

/// An order was refused before touching the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rejected {
    pub order_id: i64,
    pub price: i64,
    pub qty: i64,
    pub side: Side,
    pub reason: &'static str,
}

/// Output events from the matching engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchEvent {
    /// A fill slice was executed
    Trade(Trade),
    /// An order rested in the book
    Accepted(Accepted),
    /// An order was refused
    Rejected(Rejected),
}

/// Receiver for engine output, called on the matching thread.
///
/// Implementations that hand events to another thread (e.g. an egress
/// ring) own their own synchronization.
pub trait EventSink {
    /// One fill slice for `order_id` at `price`. Emitted twice per slice:
    /// first for the passive order, then for the aggressor.
    fn on_trade(&mut self, order_id: i64, price: i64, qty: i64, side: Side);

    /// `qty` rested at `price`. At most one per input order.
    fn on_accepted(&mut self, order_id: i64, price: i64, qty: i64, side: Side);

    /// Validation lives upstream, so the engine itself never rejects;
    /// the hook exists for gateways that reuse the sink.
    fn on_rejected(&mut self, order_id: i64, price: i64, qty: i64, side: Side, reason: &'static str) {
        let _ = (order_id, price, qty, side, reason);
    }
}

/// Sink that records every event, used by tests and benches.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<MatchEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Trades only, in emission order.
    pub fn trades(&self) -> Vec<Trade> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MatchEvent::Trade(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    /// Accepted events only, in emission order.
    pub fn accepted(&self) -> Vec<Accepted> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MatchEvent::Accepted(a) => Some(*a),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventLog {
    fn on_trade(&mut self, order_id: i64, price: i64, qty: i64, side: Side) {
        self.events.push(MatchEvent::Trade(Trade {
            order_id,
            price,
            qty,
            side,
        }));
    }

    fn on_accepted(&mut self, order_id: i64, price: i64, qty: i64, side: Side) {
        self.events.push(MatchEvent::Accepted(Accepted {
            order_id,
            price,
            qty,
            side,
        }));
    }

    fn on_rejected(&mut self, order_id: i64, price: i64, qty: i64, side: Side, reason: &'static str) {
        self.events.push(MatchEvent::Rejected(Rejected {
            order_id,
            price,
            qty,
            side,
            reason,
        }));
    }
}

/// Sink that discards everything. Used by the warm-up service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    #[inline]
    fn on_trade(&mut self, _: i64, _: i64, _: i64, _: Side) {}

    #[inline]
    fn on_accepted(&mut self, _: i64, _: i64, _: i64, _: Side) {}
}
