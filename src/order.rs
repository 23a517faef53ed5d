//! Resting order - the pooled payload of a price level's FIFO queue.

use crate::command::Side;
use crate::pool::{Poolable, NULL_INDEX};

/// A resting order in the book.
///
/// The FIFO linkage lives inside the order itself (`prev`/`next` are
/// order-pool indices), so queue insertion and removal never allocate
/// node wrappers.
#[derive(Clone, Copy, Debug)]
pub struct Order {
    /// External order ID
    pub id: i64,
    /// Fixed-point limit price
    pub price: i64,
    /// Remaining quantity to fill
    pub qty: i64,
    /// Order side
    pub side: Side,

    /// Previous (older) order at the same price level
    pub prev: u32,
    /// Next (newer) order at the same price level
    pub next: u32,
}

impl Poolable for Order {
    fn vacant() -> Self {
        Self {
            id: 0,
            price: 0,
            qty: 0,
            side: Side::Buy,
            prev: NULL_INDEX,
            next: NULL_INDEX,
        }
    }

    fn reset(&mut self) {
        self.id = 0;
        self.price = 0;
        self.qty = 0;
        self.side = Side::Buy;
        self.prev = NULL_INDEX;
        self.next = NULL_INDEX;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vacant_order_is_unlinked() {
        let order = Order::vacant();
        assert_eq!(order.prev, NULL_INDEX);
        assert_eq!(order.next, NULL_INDEX);
        assert_eq!(order.qty, 0);
    }

    #[test]
    fn test_reset_clears_linkage() {
        let mut order = Order::vacant();
        order.id = 9;
        order.qty = 100;
        order.prev = 3;
        order.next = 4;
        order.reset();
        assert_eq!(order.id, 0);
        assert_eq!(order.qty, 0);
        assert_eq!(order.prev, NULL_INDEX);
        assert_eq!(order.next, NULL_INDEX);
    }
}
