//! Property-based invariants over random order streams.
//!
//! Generates synthetic submissions in a tight price band (to force
//! heavy crossing) and replays them through the engine, checking the
//! structural invariants after every step and the accounting
//! invariants over the full event stream.

use std::collections::HashMap;

use microlob::{EventLog, MatchEvent, MatchingEngine, Side};
use proptest::prelude::*;

const ORDER_CAPACITY: u32 = 2048;
const LEVEL_CAPACITY: u32 = 128;

#[derive(Clone, Debug)]
struct Submission {
    id: i64,
    price: i64,
    qty: i64,
    side: Side,
}

fn submissions(max: usize) -> impl Strategy<Value = Vec<Submission>> {
    prop::collection::vec((9_990i64..=10_010, 1i64..=50, prop::bool::ANY), 1..max).prop_map(
        |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (price, qty, is_buy))| Submission {
                    id: i as i64 + 1,
                    price,
                    qty,
                    side: if is_buy { Side::Buy } else { Side::Sell },
                })
                .collect()
        },
    )
}

/// Replay the stream, checking the per-step invariants, and return the
/// engine plus one event list per submission.
fn run(subs: &[Submission]) -> (MatchingEngine, Vec<Vec<MatchEvent>>) {
    let mut engine = MatchingEngine::with_capacity(ORDER_CAPACITY, LEVEL_CAPACITY);
    let mut logs = Vec::with_capacity(subs.len());

    for sub in subs {
        let mut log = EventLog::new();
        engine.accept_order(sub.id, sub.price, sub.qty, sub.side, &mut log);

        // The book is never crossed at rest
        if let (Some(bid), Some(ask)) = (engine.best_bid(), engine.best_ask()) {
            assert!(bid < ask, "book crossed after id {}: {bid} >= {ask}", sub.id);
        }
        // Map/tree lockstep and red-black structure hold after every step
        engine.validate();

        logs.push(log.events);
    }

    (engine, logs)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn conservation_priority_and_pool_closure(subs in submissions(300)) {
        let (engine, logs) = run(&subs);

        let mut filled: HashMap<i64, i64> = HashMap::new();
        let mut accepted_qty: HashMap<i64, i64> = HashMap::new();
        let mut acceptance_seq: HashMap<i64, usize> = HashMap::new();
        let mut next_seq = 0usize;

        for (sub, events) in subs.iter().zip(&logs) {
            let mut aggressor_filled = 0i64;
            // Last-seen acceptance order per price, for the FIFO check
            let mut last_passive_seq: HashMap<i64, usize> = HashMap::new();

            for event in events {
                match event {
                    MatchEvent::Trade(t) => {
                        *filled.entry(t.order_id).or_default() += t.qty;

                        if t.order_id == sub.id {
                            aggressor_filled += t.qty;
                            // The aggressor never trades past its limit
                            match sub.side {
                                Side::Buy => prop_assert!(t.price <= sub.price),
                                Side::Sell => prop_assert!(t.price >= sub.price),
                            }
                        } else {
                            // Passive fills at one price follow acceptance order
                            let seq = acceptance_seq[&t.order_id];
                            if let Some(&prev) = last_passive_seq.get(&t.price) {
                                prop_assert!(
                                    seq >= prev,
                                    "FIFO violated at price {}: seq {} after {}",
                                    t.price, seq, prev
                                );
                            }
                            last_passive_seq.insert(t.price, seq);
                        }
                    }
                    MatchEvent::Accepted(a) => {
                        prop_assert_eq!(a.order_id, sub.id);
                        prop_assert_eq!(a.price, sub.price);
                        prop_assert_eq!(a.qty, sub.qty - aggressor_filled);
                        accepted_qty.insert(a.order_id, a.qty);
                        acceptance_seq.insert(a.order_id, next_seq);
                        next_seq += 1;
                    }
                    MatchEvent::Rejected(_) => {
                        prop_assert!(false, "engine rejected a valid order");
                    }
                }
            }
        }

        // Mass conservation: fills plus final residual equal the
        // submitted size for every order
        let mut resting_orders = 0u32;
        let mut resting_qty = 0i64;
        for sub in &subs {
            let filled_qty = filled.get(&sub.id).copied().unwrap_or(0);
            prop_assert!(filled_qty <= sub.qty);

            match accepted_qty.get(&sub.id) {
                Some(&acc) => {
                    let residual = sub.qty - filled_qty;
                    prop_assert!(residual >= 0);
                    prop_assert!(residual <= acc);
                    if residual > 0 {
                        resting_orders += 1;
                        resting_qty += residual;
                    }
                }
                None => prop_assert_eq!(
                    filled_qty, sub.qty,
                    "order {} never rested yet is not fully filled", sub.id
                ),
            }
        }

        // Pool closure: live objects exactly account for the capacity gap
        prop_assert_eq!(engine.open_orders(), resting_orders);
        prop_assert_eq!(engine.order_pool_available(), ORDER_CAPACITY - resting_orders);
        prop_assert_eq!(
            engine.level_pool_available(),
            LEVEL_CAPACITY - engine.active_levels()
        );

        // Book depth agrees with the residuals computed from events
        let mut book_qty = 0i64;
        for price in 9_990..=10_010 {
            book_qty += engine.depth_at(Side::Buy, price);
            book_qty += engine.depth_at(Side::Sell, price);
        }
        prop_assert_eq!(book_qty, resting_qty);
    }

    #[test]
    fn replay_is_deterministic(subs in submissions(200)) {
        let (_, first) = run(&subs);
        let (_, second) = run(&subs);
        prop_assert_eq!(first, second);
    }
}
