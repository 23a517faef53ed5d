//! Composition root: command ring in, pinned matching thread, egress
//! events out.
//!
//! Wires the pieces together the way a deployment would - I/O thread
//! encodes inbound frames and publishes them to the ring, the matching
//! thread consumes and emits execution events - and drives a
//! deterministic sample stream through the whole path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use microlob::{
    ring, Command, Engine, MatchEvent, OrderFrame, OrderFrameMut, Side, ORDER_FRAME_LEN,
    RING_CAPACITY,
};

const SAMPLE_ORDERS: i64 = 100_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (mut command_tx, mut command_rx) = ring::ring::<Command>(RING_CAPACITY);
    let (mut event_tx, mut event_rx) = rtrb::RingBuffer::<MatchEvent>::new(RING_CAPACITY);

    let running = Arc::new(AtomicBool::new(true));
    let engine_flag = Arc::clone(&running);

    let matching_thread = thread::spawn(move || {
        let mut engine = Engine::new();
        engine.warm_up();
        engine.run(&mut command_rx, &mut event_tx, &engine_flag, true);
        engine.open_orders()
    });

    let start = Instant::now();
    let mut trades = 0u64;
    let mut accepts = 0u64;
    let mut frame_buf = [0u8; ORDER_FRAME_LEN];

    // I/O thread role: encode each order as a wire frame, decode it
    // through the view, publish the command, and drain any egress
    // events that have accumulated.
    for i in 0..SAMPLE_ORDERS {
        let side = if i % 2 == 0 { Side::Sell } else { Side::Buy };
        let price = 10_000 + (i % 50) - 25;
        let qty = 1 + (i % 7);

        OrderFrameMut::wrap(&mut frame_buf, 0)
            .expect("frame buffer sized for one order")
            .set_order_id(i + 1)
            .set_price(price)
            .set_quantity(qty)
            .set_side(side);

        let cmd = OrderFrame::wrap(&frame_buf, 0)
            .expect("frame buffer sized for one order")
            .to_command()
            .expect("side byte written by this process");

        command_tx.push(cmd);

        while let Ok(event) = event_rx.pop() {
            tally(event, &mut trades, &mut accepts);
        }
    }

    // Producer halted; signal the drain and keep the egress flowing
    // until the matching thread exits.
    running.store(false, Ordering::Release);
    while !matching_thread.is_finished() {
        while let Ok(event) = event_rx.pop() {
            tally(event, &mut trades, &mut accepts);
        }
        std::hint::spin_loop();
    }
    let open_orders = matching_thread.join().expect("matching thread panicked");
    while let Ok(event) = event_rx.pop() {
        tally(event, &mut trades, &mut accepts);
    }

    let elapsed = start.elapsed();
    println!("processed {SAMPLE_ORDERS} orders in {elapsed:?}");
    println!("  fill events:   {trades}");
    println!("  accept events: {accepts}");
    println!("  resting:       {open_orders}");
}

fn tally(event: MatchEvent, trades: &mut u64, accepts: &mut u64) {
    match event {
        MatchEvent::Trade(_) => *trades += 1,
        MatchEvent::Accepted(_) => *accepts += 1,
        MatchEvent::Rejected(_) => {}
    }
}
