//! Engine - runtime wrapper with CPU pinning, warm-up, and the
//! busy-spin event loop.
//!
//! Owns the matching core and connects it to the command ring on one
//! side and an egress event ring (rtrb) on the other. The loop never
//! blocks: it spins on the consumer cursor so the cache stays hot and
//! there is no wake-up latency.

use std::time::Instant;

use crate::command::Side;
use crate::events::NullSink;
use crate::matching::MatchingEngine;

#[cfg(feature = "runtime")]
use crate::command::Command;
#[cfg(feature = "runtime")]
use crate::events::{Accepted, EventSink, MatchEvent, Rejected, Trade};
#[cfg(feature = "runtime")]
use crate::ring;
#[cfg(feature = "runtime")]
use std::sync::atomic::{AtomicBool, Ordering};

/// Accept/match cycles run against a scratch engine before go-live.
pub const WARMUP_ITERATIONS: u32 = 200_000;

/// The main engine processing commands from the ring buffer.
pub struct Engine {
    /// The underlying matching core
    pub matcher: MatchingEngine,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with production pool capacities.
    pub fn new() -> Self {
        Self {
            matcher: MatchingEngine::new(),
        }
    }

    /// Engine with explicit pool capacities.
    pub fn with_capacity(order_capacity: u32, level_capacity: u32) -> Self {
        Self {
            matcher: MatchingEngine::with_capacity(order_capacity, level_capacity),
        }
    }

    /// Run the matching loop until `running` goes false and the input
    /// ring is drained.
    ///
    /// # Arguments
    /// * `input` - consumer end of the command ring
    /// * `output` - producer end of the egress event ring
    /// * `running` - cleared by the shutdown path after the I/O thread
    ///   has stopped producing
    /// * `pin` - pin this thread to the last available CPU core
    #[cfg(feature = "runtime")]
    pub fn run(
        &mut self,
        input: &mut ring::Consumer<Command>,
        output: &mut rtrb::Producer<MatchEvent>,
        running: &AtomicBool,
        pin: bool,
    ) {
        if pin {
            self.pin_to_core();
        }

        let mut sink = RingSink { out: output };
        loop {
            if let Some(cmd) = input.pop() {
                self.matcher
                    .accept_order(cmd.id, cmd.price, cmd.qty, cmd.side, &mut sink);
                continue;
            }
            // Stop only once the flag is down AND the ring is seen empty
            // after it: commands published before shutdown are drained.
            if !running.load(Ordering::Acquire) && input.is_empty() {
                break;
            }
            std::hint::spin_loop();
        }

        tracing::info!(
            open_orders = self.matcher.open_orders(),
            "matching loop stopped, input ring drained"
        );
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically the one isolated from OS interrupts.
    #[cfg(feature = "runtime")]
    pub fn pin_to_core(&self) {
        if let Some(core_ids) = core_affinity::get_core_ids() {
            if let Some(last_core) = core_ids.last() {
                if core_affinity::set_for_current(*last_core) {
                    tracing::info!(core = last_core.id, "matching thread pinned");
                } else {
                    tracing::warn!(core = last_core.id, "failed to pin matching thread");
                }
            }
        }
    }

    /// Warm up with the default iteration count.
    pub fn warm_up(&mut self) {
        self.warm_up_with(WARMUP_ITERATIONS);
    }

    /// Pre-fault the live pools, then run accept/match cycles against a
    /// throwaway engine so the code paths are hot before the first real
    /// order. The live book is never touched.
    pub fn warm_up_with(&mut self, iterations: u32) {
        let start = Instant::now();

        self.matcher.warm_up_pools();

        let mut scratch = MatchingEngine::with_capacity(1024, 64);
        let mut sink = NullSink;
        for i in 0..iterations {
            // Immediate match: exercises the cross path both ways
            scratch.accept_order(-1, 100, 10, Side::Sell, &mut sink);
            scratch.accept_order(-2, 100, 10, Side::Buy, &mut sink);

            // Occasional resting pair: exercises level create/retire
            if i % 100 == 0 {
                scratch.accept_order(-3, 50, 5, Side::Buy, &mut sink);
                scratch.accept_order(-4, 50, 5, Side::Sell, &mut sink);
            }
        }

        tracing::info!(
            iterations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "warm-up complete"
        );
    }

    /// Get the best bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<i64> {
        self.matcher.best_bid()
    }

    /// Get the best ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<i64> {
        self.matcher.best_ask()
    }

    /// Get the number of resting orders.
    #[inline]
    pub fn open_orders(&self) -> u32 {
        self.matcher.open_orders()
    }
}

/// Sink that forwards events into the egress ring.
///
/// Spins when the egress ring is full: the event stream is the system
/// of record, so back-pressure propagates rather than dropping.
#[cfg(feature = "runtime")]
struct RingSink<'a> {
    out: &'a mut rtrb::Producer<MatchEvent>,
}

#[cfg(feature = "runtime")]
impl RingSink<'_> {
    #[inline]
    fn publish(&mut self, event: MatchEvent) {
        let mut event = event;
        while let Err(rtrb::PushError::Full(e)) = self.out.push(event) {
            event = e;
            std::hint::spin_loop();
        }
    }
}

#[cfg(feature = "runtime")]
impl EventSink for RingSink<'_> {
    #[inline]
    fn on_trade(&mut self, order_id: i64, price: i64, qty: i64, side: Side) {
        self.publish(MatchEvent::Trade(Trade {
            order_id,
            price,
            qty,
            side,
        }));
    }

    #[inline]
    fn on_accepted(&mut self, order_id: i64, price: i64, qty: i64, side: Side) {
        self.publish(MatchEvent::Accepted(Accepted {
            order_id,
            price,
            qty,
            side,
        }));
    }

    #[inline]
    fn on_rejected(&mut self, order_id: i64, price: i64, qty: i64, side: Side, reason: &'static str) {
        self.publish(MatchEvent::Rejected(Rejected {
            order_id,
            price,
            qty,
            side,
            reason,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;

    #[test]
    fn test_engine_creation() {
        let engine = Engine::with_capacity(1024, 64);
        assert_eq!(engine.open_orders(), 0);
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.best_ask(), None);
    }

    #[test]
    fn test_warm_up_leaves_live_book_untouched() {
        let mut engine = Engine::with_capacity(1024, 64);
        engine.warm_up_with(500);

        assert_eq!(engine.open_orders(), 0);
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.best_ask(), None);
        assert_eq!(engine.matcher.order_pool_available(), 1024);
    }

    #[test]
    fn test_engine_processes_after_warm_up() {
        let mut engine = Engine::with_capacity(1024, 64);
        engine.warm_up_with(100);

        let mut log = EventLog::new();
        engine.matcher.accept_order(1, 10000, 100, Side::Buy, &mut log);
        assert_eq!(engine.best_bid(), Some(10000));
        assert_eq!(engine.open_orders(), 1);
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_run_loop_end_to_end() {
        use crate::command::Command;
        use crate::events::MatchEvent;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::thread;

        let (mut tx, mut rx) = ring::ring::<Command>(64);
        let (mut event_tx, mut event_rx) = rtrb::RingBuffer::<MatchEvent>::new(1024);
        let running = Arc::new(AtomicBool::new(true));

        let matcher_flag = Arc::clone(&running);
        let matching_thread = thread::spawn(move || {
            let mut engine = Engine::with_capacity(1024, 64);
            engine.run(&mut rx, &mut event_tx, &matcher_flag, false);
        });

        // One resting sell, one crossing buy with a residual
        tx.push(Command::new(1, 10000, 10, Side::Sell));
        tx.push(Command::new(2, 10000, 15, Side::Buy));

        // Halt the producer, then signal the drain
        running.store(false, Ordering::Release);
        matching_thread.join().unwrap();

        let mut events = Vec::new();
        while let Ok(ev) = event_rx.pop() {
            events.push(ev);
        }

        assert_eq!(events.len(), 4); // accept, two fills, residual accept
        assert!(matches!(events[0], MatchEvent::Accepted(a) if a.order_id == 1));
        assert!(matches!(events[1], MatchEvent::Trade(t) if t.order_id == 1));
        assert!(matches!(events[2], MatchEvent::Trade(t) if t.order_id == 2));
        assert!(matches!(events[3], MatchEvent::Accepted(a) if a.order_id == 2 && a.qty == 5));
    }
}
