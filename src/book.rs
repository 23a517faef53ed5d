//! Order Book - two symmetric sides, each a hash map + tree hybrid.
//!
//! The map gives O(1) price-to-level lookup for insertions; the tree
//! gives O(log N) best-price access and ordered retirement of emptied
//! levels. Both structures reference the same pooled level objects and
//! move in lockstep: a level is in the map if and only if it is in the
//! tree, and an empty level is in neither.

use rustc_hash::FxHashMap;

use crate::command::Side;
use crate::events::EventSink;
use crate::order::Order;
use crate::pool::{LevelIndex, Pool, NULL_INDEX};
use crate::price_level::PriceLevel;
use crate::tree::PriceTree;

/// One side of the book.
struct BookSide {
    /// price -> level handle, O(1)
    map: FxHashMap<i64, LevelIndex>,
    /// levels ordered by price, O(log N)
    tree: PriceTree,
}

impl BookSide {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            tree: PriceTree::new(),
        }
    }
}

/// The central limit order book for a single instrument.
///
/// Not thread-safe by design: the matching thread is the single writer,
/// and all storage lives in the pools it owns.
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(),
            asks: BookSide::new(),
        }
    }

    #[inline]
    fn side(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rest an order at `price`, creating the level on first use.
    ///
    /// Pre: `qty > 0`. Borrows an order slot; borrows a level slot only
    /// when this is the first order at the price.
    pub fn add_order(
        &mut self,
        orders: &mut Pool<Order>,
        levels: &mut Pool<PriceLevel>,
        id: i64,
        price: i64,
        qty: i64,
        side: Side,
    ) {
        debug_assert!(qty > 0);

        let order_idx = orders.borrow();
        {
            let order = orders.get_mut(order_idx);
            order.id = id;
            order.price = price;
            order.qty = qty;
            order.side = side;
        }

        let book_side = self.side(side);
        let level_idx = match book_side.map.get(&price) {
            Some(&idx) => idx,
            None => {
                let idx = levels.borrow();
                levels.get_mut(idx).price = price;
                book_side.map.insert(price, idx);
                book_side.tree.insert(levels, idx);
                idx
            }
        };

        levels.get_mut(level_idx).add_order(orders, order_idx);
    }

    /// Cross an incoming order against the opposite side.
    ///
    /// Consumes crossing levels in price order (ascending for a buy,
    /// descending for a sell), FIFO within each level, emitting a
    /// passive fill then an aggressor fill per slice. Returns the
    /// filled quantity; the caller rests any residual.
    pub fn match_order<S: EventSink>(
        &mut self,
        orders: &mut Pool<Order>,
        levels: &mut Pool<PriceLevel>,
        id: i64,
        price: i64,
        qty: i64,
        side: Side,
        sink: &mut S,
    ) -> i64 {
        let opposite = self.side(side.opposite());
        let mut remaining = qty;

        while remaining > 0 {
            // Best opposite level: min ask for a buy, max bid for a sell
            let best = opposite.tree.best(levels, side == Side::Buy);
            if best == NULL_INDEX {
                break;
            }

            let best_price = levels.get(best).price;
            let crosses = match side {
                Side::Buy => best_price <= price,
                Side::Sell => best_price >= price,
            };
            if !crosses {
                break;
            }

            remaining = Self::match_level(opposite, orders, levels, best, remaining, id, side, sink);
        }

        qty - remaining
    }

    /// Consume one level's FIFO from the head until the level empties or
    /// the incoming quantity is spent. Retires the level from map, tree,
    /// and pool if it empties.
    #[allow(clippy::too_many_arguments)]
    fn match_level<S: EventSink>(
        book_side: &mut BookSide,
        orders: &mut Pool<Order>,
        levels: &mut Pool<PriceLevel>,
        level_idx: LevelIndex,
        mut qty: i64,
        incoming_id: i64,
        incoming_side: Side,
        sink: &mut S,
    ) -> i64 {
        let level_price = levels.get(level_idx).price;
        let mut head = levels.get(level_idx).head;

        while head != NULL_INDEX && qty > 0 {
            let (head_id, head_side, head_qty) = {
                let order = orders.get(head);
                (order.id, order.side, order.qty)
            };

            let trade_qty = qty.min(head_qty);

            // Passive fill first, then the aggressor's
            sink.on_trade(head_id, level_price, trade_qty, head_side);
            sink.on_trade(incoming_id, level_price, trade_qty, incoming_side);

            orders.get_mut(head).qty -= trade_qty;
            levels.get_mut(level_idx).reduce_qty(trade_qty);
            qty -= trade_qty;

            if orders.get(head).qty == 0 {
                let filled = head;
                head = orders.get(head).next;
                levels.get_mut(level_idx).remove_order(orders, filled);
                orders.release(filled);
            }
        }

        if levels.get(level_idx).is_empty() {
            book_side.map.remove(&level_price);
            book_side.tree.remove(levels, level_idx);
            levels.release(level_idx);
        }

        qty
    }

    /// Highest resting buy price, if any.
    #[inline]
    pub fn best_bid(&self, levels: &Pool<PriceLevel>) -> Option<i64> {
        let best = self.bids.tree.best(levels, false);
        (best != NULL_INDEX).then(|| levels.get(best).price)
    }

    /// Lowest resting sell price, if any.
    #[inline]
    pub fn best_ask(&self, levels: &Pool<PriceLevel>) -> Option<i64> {
        let best = self.asks.tree.best(levels, true);
        (best != NULL_INDEX).then(|| levels.get(best).price)
    }

    /// Total resting quantity at a price, 0 if the level is absent.
    pub fn depth_at(&self, levels: &Pool<PriceLevel>, side: Side, price: i64) -> i64 {
        let book_side = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        book_side
            .map
            .get(&price)
            .map_or(0, |&idx| levels.get(idx).total_qty)
    }

    /// Number of price levels on a side.
    pub fn level_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.map.len(),
            Side::Sell => self.asks.map.len(),
        }
    }

    /// Check map/tree lockstep, tree structure, and per-level FIFO
    /// integrity on both sides, panicking on the first violation.
    /// Debug facility.
    pub fn validate(&self, orders: &Pool<Order>, levels: &Pool<PriceLevel>) {
        let sides = [
            (Side::Buy, "bids", &self.bids),
            (Side::Sell, "asks", &self.asks),
        ];
        for (side, name, book_side) in sides {
            book_side.tree.validate(levels);

            let mut map_prices: Vec<i64> = book_side.map.keys().copied().collect();
            map_prices.sort_unstable();
            let tree_prices = book_side.tree.prices_in_order(levels);
            assert!(
                map_prices == tree_prices,
                "{name}: map prices {map_prices:?} != tree prices {tree_prices:?}"
            );

            for (&price, &idx) in &book_side.map {
                let level = levels.get(idx);
                assert!(level.price == price, "{name}: level price mismatch at {price}");
                assert!(!level.is_empty(), "{name}: empty level resting at {price}");

                // Walk head to tail: links consistent, quantities add up
                let mut sum = 0i64;
                let mut prev = NULL_INDEX;
                let mut cursor = level.head;
                while cursor != NULL_INDEX {
                    let order = orders.get(cursor);
                    assert!(order.prev == prev, "{name}: broken prev link at {price}");
                    assert!(order.price == price, "{name}: order price mismatch at {price}");
                    assert!(order.side == side, "{name}: order side mismatch at {price}");
                    assert!(order.qty > 0, "{name}: zero-qty order resting at {price}");
                    sum += order.qty;
                    prev = cursor;
                    cursor = order.next;
                }
                assert!(prev == level.tail, "{name}: tail link mismatch at {price}");
                assert!(
                    sum == level.total_qty,
                    "{name}: level total {} != queue sum {sum} at {price}",
                    level.total_qty
                );
            }
        }
    }
}
