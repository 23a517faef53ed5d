//! Price Level - a FIFO queue of orders at a single price point.
//!
//! The level is a "fat" node: it heads the intrusive doubly-linked list
//! of its orders (price-time priority) and simultaneously *is* a node of
//! its side's price tree (`left`/`right`/`parent`/`color` live right
//! here). One pooled object, two structural roles, zero wrappers.

use crate::order::Order;
use crate::pool::{OrderIndex, Pool, Poolable, NULL_INDEX};

/// Node color for the price tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Black = 1,
}

/// All resting orders at one price on one side.
///
/// Orders queue FIFO: matching consumes from `head` (oldest), new
/// residuals append at `tail`. The embedded `prev`/`next` indices give
/// O(1) unlink from any position.
#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    /// Price shared by every order in this level
    pub price: i64,
    /// Oldest order (highest priority, first to match)
    pub head: OrderIndex,
    /// Newest order (last to match)
    pub tail: OrderIndex,
    /// Sum of remaining quantity across the queue
    pub total_qty: i64,

    /// Tree linkage (level-pool indices)
    pub left: u32,
    pub right: u32,
    pub parent: u32,
    pub color: Color,
}

impl Poolable for PriceLevel {
    fn vacant() -> Self {
        Self {
            price: 0,
            head: NULL_INDEX,
            tail: NULL_INDEX,
            total_qty: 0,
            left: NULL_INDEX,
            right: NULL_INDEX,
            parent: NULL_INDEX,
            color: Color::Black,
        }
    }

    fn reset(&mut self) {
        self.price = 0;
        self.head = NULL_INDEX;
        self.tail = NULL_INDEX;
        self.total_qty = 0;
        self.left = NULL_INDEX;
        self.right = NULL_INDEX;
        self.parent = NULL_INDEX;
        self.color = Color::Black;
    }
}

impl PriceLevel {
    /// Returns true if there are no orders at this level
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.head == NULL_INDEX
    }

    /// Append an order at the tail of the queue (newest position).
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn add_order(&mut self, orders: &mut Pool<Order>, index: OrderIndex) {
        let qty = orders.get(index).qty;

        if self.head == NULL_INDEX {
            debug_assert!(self.tail == NULL_INDEX);
            self.head = index;
            self.tail = index;
            let order = orders.get_mut(index);
            order.prev = NULL_INDEX;
            order.next = NULL_INDEX;
        } else {
            orders.get_mut(self.tail).next = index;
            let order = orders.get_mut(index);
            order.prev = self.tail;
            order.next = NULL_INDEX;
            self.tail = index;
        }

        self.total_qty += qty;
    }

    /// Unlink an order from anywhere in the queue.
    ///
    /// Subtracts the order's *remaining* quantity from the level total,
    /// so a fully-filled order (qty already zero) leaves the total
    /// untouched. Precondition: the order is in this level's list.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn remove_order(&mut self, orders: &mut Pool<Order>, index: OrderIndex) {
        let (prev, next, qty) = {
            let order = orders.get(index);
            (order.prev, order.next, order.qty)
        };

        if prev != NULL_INDEX {
            orders.get_mut(prev).next = next;
        } else {
            debug_assert!(self.head == index);
            self.head = next;
        }

        if next != NULL_INDEX {
            orders.get_mut(next).prev = prev;
        } else {
            debug_assert!(self.tail == index);
            self.tail = prev;
        }

        self.total_qty -= qty;

        let order = orders.get_mut(index);
        order.prev = NULL_INDEX;
        order.next = NULL_INDEX;
    }

    /// Account for a partial fill applied directly to an order's qty.
    #[inline]
    pub fn reduce_qty(&mut self, qty: i64) {
        debug_assert!(self.total_qty >= qty);
        self.total_qty -= qty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Side;

    fn setup_orders(orders: &mut Pool<Order>, count: u32) -> Vec<OrderIndex> {
        (0..count)
            .map(|i| {
                let idx = orders.borrow();
                let order = orders.get_mut(idx);
                order.id = i as i64;
                order.price = 10000;
                order.qty = 100;
                order.side = Side::Buy;
                idx
            })
            .collect()
    }

    #[test]
    fn test_empty_level() {
        let level = PriceLevel::vacant();
        assert!(level.is_empty());
        assert_eq!(level.total_qty, 0);
        assert_eq!(level.head, NULL_INDEX);
        assert_eq!(level.tail, NULL_INDEX);
    }

    #[test]
    fn test_add_single_order() {
        let mut orders: Pool<Order> = Pool::with_capacity(8);
        let mut level = PriceLevel::vacant();

        let idx = setup_orders(&mut orders, 1)[0];
        level.add_order(&mut orders, idx);

        assert!(!level.is_empty());
        assert_eq!(level.head, idx);
        assert_eq!(level.tail, idx);
        assert_eq!(level.total_qty, 100);
    }

    #[test]
    fn test_fifo_linkage() {
        let mut orders: Pool<Order> = Pool::with_capacity(8);
        let mut level = PriceLevel::vacant();
        let idx = setup_orders(&mut orders, 3);

        for &i in &idx {
            level.add_order(&mut orders, i);
        }

        assert_eq!(level.head, idx[0]);
        assert_eq!(level.tail, idx[2]);
        assert_eq!(level.total_qty, 300);

        assert_eq!(orders.get(idx[0]).next, idx[1]);
        assert_eq!(orders.get(idx[1]).prev, idx[0]);
        assert_eq!(orders.get(idx[1]).next, idx[2]);
        assert_eq!(orders.get(idx[2]).prev, idx[1]);
    }

    #[test]
    fn test_remove_head() {
        let mut orders: Pool<Order> = Pool::with_capacity(8);
        let mut level = PriceLevel::vacant();
        let idx = setup_orders(&mut orders, 3);
        for &i in &idx {
            level.add_order(&mut orders, i);
        }

        level.remove_order(&mut orders, idx[0]);

        assert_eq!(level.head, idx[1]);
        assert_eq!(orders.get(idx[1]).prev, NULL_INDEX);
        assert_eq!(level.total_qty, 200);
    }

    #[test]
    fn test_remove_tail() {
        let mut orders: Pool<Order> = Pool::with_capacity(8);
        let mut level = PriceLevel::vacant();
        let idx = setup_orders(&mut orders, 3);
        for &i in &idx {
            level.add_order(&mut orders, i);
        }

        level.remove_order(&mut orders, idx[2]);

        assert_eq!(level.tail, idx[1]);
        assert_eq!(orders.get(idx[1]).next, NULL_INDEX);
    }

    #[test]
    fn test_remove_middle() {
        let mut orders: Pool<Order> = Pool::with_capacity(8);
        let mut level = PriceLevel::vacant();
        let idx = setup_orders(&mut orders, 3);
        for &i in &idx {
            level.add_order(&mut orders, i);
        }

        level.remove_order(&mut orders, idx[1]);

        assert_eq!(orders.get(idx[0]).next, idx[2]);
        assert_eq!(orders.get(idx[2]).prev, idx[0]);
        assert_eq!(level.total_qty, 200);
    }

    #[test]
    fn test_remove_only_order_empties_level() {
        let mut orders: Pool<Order> = Pool::with_capacity(8);
        let mut level = PriceLevel::vacant();
        let idx = setup_orders(&mut orders, 1)[0];
        level.add_order(&mut orders, idx);

        level.remove_order(&mut orders, idx);

        assert!(level.is_empty());
        assert_eq!(level.head, NULL_INDEX);
        assert_eq!(level.tail, NULL_INDEX);
        assert_eq!(level.total_qty, 0);
    }

    #[test]
    fn test_filled_order_removal_keeps_total_consistent() {
        let mut orders: Pool<Order> = Pool::with_capacity(8);
        let mut level = PriceLevel::vacant();
        let idx = setup_orders(&mut orders, 2);
        for &i in &idx {
            level.add_order(&mut orders, i);
        }

        // Simulate a full fill of the head: qty goes to zero first,
        // the level total is reduced by the traded amount, then the
        // emptied order is unlinked.
        orders.get_mut(idx[0]).qty = 0;
        level.reduce_qty(100);
        level.remove_order(&mut orders, idx[0]);

        assert_eq!(level.total_qty, 100);
        assert_eq!(level.head, idx[1]);
    }
}
