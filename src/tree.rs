//! Intrusive red-black tree over price levels.
//!
//! The tree stores no nodes of its own: each [`PriceLevel`] carries its
//! `left`/`right`/`parent` indices and a color bit, so inserting a level
//! is pure pointer (index) surgery with zero allocation. Prices increase
//! left to right, which makes the best ask the leftmost node of the ask
//! tree and the best bid the rightmost node of the bid tree.
//!
//! Red-black rules enforced after every insert and remove:
//! 1. Every node is red or black.
//! 2. The root is black.
//! 3. No red node has a red child.
//! 4. Every root-to-nil path crosses the same number of black nodes.
//!
//! Deletion reduces the two-child case by *physically swapping* the node
//! with its successor in the topology - never by copying fields - so any
//! level index held elsewhere (the price map, the match loop) stays
//! valid across the removal.

use crate::pool::{LevelIndex, Pool, NULL_INDEX};
use crate::price_level::{Color, PriceLevel};

/// Ordered index of one side's price levels.
#[derive(Debug)]
pub struct PriceTree {
    root: LevelIndex,
}

impl Default for PriceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceTree {
    pub const fn new() -> Self {
        Self { root: NULL_INDEX }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.root == NULL_INDEX
    }

    /// Standard BST lookup by price.
    pub fn find(&self, levels: &Pool<PriceLevel>, price: i64) -> LevelIndex {
        let mut current = self.root;
        while current != NULL_INDEX {
            let node = levels.get(current);
            if price == node.price {
                return current;
            } else if price < node.price {
                current = node.left;
            } else {
                current = node.right;
            }
        }
        NULL_INDEX
    }

    /// Extremum lookup: leftmost (minimum price) when `min` is true,
    /// rightmost (maximum price) otherwise.
    ///
    /// # Complexity
    /// O(log N)
    pub fn best(&self, levels: &Pool<PriceLevel>, min: bool) -> LevelIndex {
        let mut current = self.root;
        if current == NULL_INDEX {
            return NULL_INDEX;
        }
        loop {
            let next = if min {
                levels.get(current).left
            } else {
                levels.get(current).right
            };
            if next == NULL_INDEX {
                return current;
            }
            current = next;
        }
    }

    /// Insert a level whose price is not already present (the caller's
    /// price map guarantees uniqueness).
    pub fn insert(&mut self, levels: &mut Pool<PriceLevel>, node: LevelIndex) {
        debug_assert!(node != NULL_INDEX);

        // Clear any linkage left over from the pool; new nodes start red.
        {
            let n = levels.get_mut(node);
            n.left = NULL_INDEX;
            n.right = NULL_INDEX;
            n.parent = NULL_INDEX;
            n.color = Color::Red;
        }

        if self.root == NULL_INDEX {
            self.root = node;
            levels.get_mut(node).color = Color::Black;
            return;
        }

        // Standard BST descent to the attachment point
        let price = levels.get(node).price;
        let mut current = self.root;
        let mut parent = NULL_INDEX;

        while current != NULL_INDEX {
            parent = current;
            let cur = levels.get(current);
            if price < cur.price {
                current = cur.left;
            } else if price > cur.price {
                current = cur.right;
            } else {
                debug_assert!(false, "duplicate price in tree");
                return;
            }
        }

        levels.get_mut(node).parent = parent;
        if price < levels.get(parent).price {
            levels.get_mut(parent).left = node;
        } else {
            levels.get_mut(parent).right = node;
        }

        self.fix_after_insert(levels, node);
    }

    /// Remove a level known to be in the tree.
    pub fn remove(&mut self, levels: &mut Pool<PriceLevel>, node: LevelIndex) {
        debug_assert!(node != NULL_INDEX);
        debug_assert!(
            self.find(levels, levels.get(node).price) == node,
            "removing a level that is not in the tree"
        );
        self.delete_node(levels, node);
    }

    // ========================================================================
    // NULL-safe field helpers
    // ========================================================================

    #[inline]
    fn left_of(levels: &Pool<PriceLevel>, n: LevelIndex) -> LevelIndex {
        if n == NULL_INDEX {
            NULL_INDEX
        } else {
            levels.get(n).left
        }
    }

    #[inline]
    fn right_of(levels: &Pool<PriceLevel>, n: LevelIndex) -> LevelIndex {
        if n == NULL_INDEX {
            NULL_INDEX
        } else {
            levels.get(n).right
        }
    }

    #[inline]
    fn parent_of(levels: &Pool<PriceLevel>, n: LevelIndex) -> LevelIndex {
        if n == NULL_INDEX {
            NULL_INDEX
        } else {
            levels.get(n).parent
        }
    }

    #[inline]
    fn grandparent_of(levels: &Pool<PriceLevel>, n: LevelIndex) -> LevelIndex {
        Self::parent_of(levels, Self::parent_of(levels, n))
    }

    /// Nil nodes count as black.
    #[inline]
    fn is_red(levels: &Pool<PriceLevel>, n: LevelIndex) -> bool {
        n != NULL_INDEX && levels.get(n).color == Color::Red
    }

    #[inline]
    fn is_black(levels: &Pool<PriceLevel>, n: LevelIndex) -> bool {
        !Self::is_red(levels, n)
    }

    #[inline]
    fn color_of(levels: &Pool<PriceLevel>, n: LevelIndex) -> Color {
        if n == NULL_INDEX {
            Color::Black
        } else {
            levels.get(n).color
        }
    }

    #[inline]
    fn set_color(levels: &mut Pool<PriceLevel>, n: LevelIndex, color: Color) {
        if n != NULL_INDEX {
            levels.get_mut(n).color = color;
        }
    }

    // ========================================================================
    // Rotations
    // ========================================================================

    /// Pull `p`'s right child up, pushing `p` down to the left.
    fn rotate_left(&mut self, levels: &mut Pool<PriceLevel>, p: LevelIndex) {
        if p == NULL_INDEX {
            return;
        }
        let r = levels.get(p).right;
        let r_left = levels.get(r).left;

        levels.get_mut(p).right = r_left;
        if r_left != NULL_INDEX {
            levels.get_mut(r_left).parent = p;
        }

        let p_parent = levels.get(p).parent;
        levels.get_mut(r).parent = p_parent;
        if p_parent == NULL_INDEX {
            self.root = r;
        } else if levels.get(p_parent).left == p {
            levels.get_mut(p_parent).left = r;
        } else {
            levels.get_mut(p_parent).right = r;
        }

        levels.get_mut(r).left = p;
        levels.get_mut(p).parent = r;
    }

    /// Mirror of `rotate_left`.
    fn rotate_right(&mut self, levels: &mut Pool<PriceLevel>, p: LevelIndex) {
        if p == NULL_INDEX {
            return;
        }
        let l = levels.get(p).left;
        let l_right = levels.get(l).right;

        levels.get_mut(p).left = l_right;
        if l_right != NULL_INDEX {
            levels.get_mut(l_right).parent = p;
        }

        let p_parent = levels.get(p).parent;
        levels.get_mut(l).parent = p_parent;
        if p_parent == NULL_INDEX {
            self.root = l;
        } else if levels.get(p_parent).right == p {
            levels.get_mut(p_parent).right = l;
        } else {
            levels.get_mut(p_parent).left = l;
        }

        levels.get_mut(l).right = p;
        levels.get_mut(p).parent = l;
    }

    // ========================================================================
    // Rebalancing
    // ========================================================================

    /// Restore the red-black rules after inserting a red node.
    fn fix_after_insert(&mut self, levels: &mut Pool<PriceLevel>, mut node: LevelIndex) {
        Self::set_color(levels, node, Color::Red);

        while node != NULL_INDEX
            && node != self.root
            && Self::is_red(levels, Self::parent_of(levels, node))
        {
            if Self::parent_of(levels, node)
                == Self::left_of(levels, Self::grandparent_of(levels, node))
            {
                let uncle = Self::right_of(levels, Self::grandparent_of(levels, node));

                if Self::is_red(levels, uncle) {
                    // Red uncle: recolor and push the violation up
                    Self::set_color(levels, Self::parent_of(levels, node), Color::Black);
                    Self::set_color(levels, uncle, Color::Black);
                    Self::set_color(levels, Self::grandparent_of(levels, node), Color::Red);
                    node = Self::grandparent_of(levels, node);
                } else {
                    // Zig-zag: straighten into a line first
                    if node == Self::right_of(levels, Self::parent_of(levels, node)) {
                        node = Self::parent_of(levels, node);
                        self.rotate_left(levels, node);
                    }
                    Self::set_color(levels, Self::parent_of(levels, node), Color::Black);
                    Self::set_color(levels, Self::grandparent_of(levels, node), Color::Red);
                    self.rotate_right(levels, Self::grandparent_of(levels, node));
                }
            } else {
                // Mirror image: parent is the right child
                let uncle = Self::left_of(levels, Self::grandparent_of(levels, node));

                if Self::is_red(levels, uncle) {
                    Self::set_color(levels, Self::parent_of(levels, node), Color::Black);
                    Self::set_color(levels, uncle, Color::Black);
                    Self::set_color(levels, Self::grandparent_of(levels, node), Color::Red);
                    node = Self::grandparent_of(levels, node);
                } else {
                    if node == Self::left_of(levels, Self::parent_of(levels, node)) {
                        node = Self::parent_of(levels, node);
                        self.rotate_right(levels, node);
                    }
                    Self::set_color(levels, Self::parent_of(levels, node), Color::Black);
                    Self::set_color(levels, Self::grandparent_of(levels, node), Color::Red);
                    self.rotate_left(levels, Self::grandparent_of(levels, node));
                }
            }
        }
        Self::set_color(levels, self.root, Color::Black);
    }

    fn delete_node(&mut self, levels: &mut Pool<PriceLevel>, node: LevelIndex) {
        if node == NULL_INDEX {
            return;
        }

        // Two children: physically swap with the in-order successor so
        // the node to unlink has at most one child. External indices
        // keep pointing at the same levels.
        if levels.get(node).left != NULL_INDEX && levels.get(node).right != NULL_INDEX {
            let succ = Self::successor(levels, node);
            self.swap_nodes(levels, node, succ);
        }

        let replacement = if levels.get(node).left != NULL_INDEX {
            levels.get(node).left
        } else {
            levels.get(node).right
        };

        if replacement != NULL_INDEX {
            let node_parent = levels.get(node).parent;
            levels.get_mut(replacement).parent = node_parent;
            if node_parent == NULL_INDEX {
                self.root = replacement;
            } else if node == levels.get(node_parent).left {
                levels.get_mut(node_parent).left = replacement;
            } else {
                levels.get_mut(node_parent).right = replacement;
            }

            let node_color = levels.get(node).color;
            {
                let n = levels.get_mut(node);
                n.left = NULL_INDEX;
                n.right = NULL_INDEX;
                n.parent = NULL_INDEX;
            }

            // Unlinking a black node leaves a path short one black
            if node_color == Color::Black {
                self.fix_after_delete(levels, replacement);
            }
        } else if levels.get(node).parent == NULL_INDEX {
            // Last node in the tree
            self.root = NULL_INDEX;
        } else {
            // Leaf: rebalance while still linked, then detach
            if levels.get(node).color == Color::Black {
                self.fix_after_delete(levels, node);
            }

            let node_parent = levels.get(node).parent;
            if node_parent != NULL_INDEX {
                if node == levels.get(node_parent).left {
                    levels.get_mut(node_parent).left = NULL_INDEX;
                } else if node == levels.get(node_parent).right {
                    levels.get_mut(node_parent).right = NULL_INDEX;
                }
                levels.get_mut(node).parent = NULL_INDEX;
            }
        }
    }

    fn fix_after_delete(&mut self, levels: &mut Pool<PriceLevel>, mut x: LevelIndex) {
        while x != self.root && Self::is_black(levels, x) {
            if x == Self::left_of(levels, Self::parent_of(levels, x)) {
                let mut sib = Self::right_of(levels, Self::parent_of(levels, x));

                if Self::is_red(levels, sib) {
                    Self::set_color(levels, sib, Color::Black);
                    Self::set_color(levels, Self::parent_of(levels, x), Color::Red);
                    self.rotate_left(levels, Self::parent_of(levels, x));
                    sib = Self::right_of(levels, Self::parent_of(levels, x));
                }

                if Self::is_black(levels, Self::left_of(levels, sib))
                    && Self::is_black(levels, Self::right_of(levels, sib))
                {
                    Self::set_color(levels, sib, Color::Red);
                    x = Self::parent_of(levels, x);
                } else {
                    if Self::is_black(levels, Self::right_of(levels, sib)) {
                        Self::set_color(levels, Self::left_of(levels, sib), Color::Black);
                        Self::set_color(levels, sib, Color::Red);
                        self.rotate_right(levels, sib);
                        sib = Self::right_of(levels, Self::parent_of(levels, x));
                    }
                    let parent_color = Self::color_of(levels, Self::parent_of(levels, x));
                    Self::set_color(levels, sib, parent_color);
                    Self::set_color(levels, Self::parent_of(levels, x), Color::Black);
                    Self::set_color(levels, Self::right_of(levels, sib), Color::Black);
                    self.rotate_left(levels, Self::parent_of(levels, x));
                    x = self.root;
                }
            } else {
                // Symmetric
                let mut sib = Self::left_of(levels, Self::parent_of(levels, x));

                if Self::is_red(levels, sib) {
                    Self::set_color(levels, sib, Color::Black);
                    Self::set_color(levels, Self::parent_of(levels, x), Color::Red);
                    self.rotate_right(levels, Self::parent_of(levels, x));
                    sib = Self::left_of(levels, Self::parent_of(levels, x));
                }

                if Self::is_black(levels, Self::right_of(levels, sib))
                    && Self::is_black(levels, Self::left_of(levels, sib))
                {
                    Self::set_color(levels, sib, Color::Red);
                    x = Self::parent_of(levels, x);
                } else {
                    if Self::is_black(levels, Self::left_of(levels, sib)) {
                        Self::set_color(levels, Self::right_of(levels, sib), Color::Black);
                        Self::set_color(levels, sib, Color::Red);
                        self.rotate_left(levels, sib);
                        sib = Self::left_of(levels, Self::parent_of(levels, x));
                    }
                    let parent_color = Self::color_of(levels, Self::parent_of(levels, x));
                    Self::set_color(levels, sib, parent_color);
                    Self::set_color(levels, Self::parent_of(levels, x), Color::Black);
                    Self::set_color(levels, Self::left_of(levels, sib), Color::Black);
                    self.rotate_right(levels, Self::parent_of(levels, x));
                    x = self.root;
                }
            }
        }
        Self::set_color(levels, x, Color::Black);
    }

    /// Swap two nodes in the tree topology (links and colors), leaving
    /// their payloads untouched.
    fn swap_nodes(&mut self, levels: &mut Pool<PriceLevel>, x: LevelIndex, y: LevelIndex) {
        let (x_parent, x_left, x_right, x_color) = {
            let n = levels.get(x);
            (n.parent, n.left, n.right, n.color)
        };
        let (y_parent, y_left, y_right, y_color) = {
            let n = levels.get(y);
            (n.parent, n.left, n.right, n.color)
        };

        let y_is_child = y == x_right;

        // Move y into x's position
        levels.get_mut(y).parent = x_parent;
        if x_parent != NULL_INDEX {
            if levels.get(x_parent).left == x {
                levels.get_mut(x_parent).left = y;
            } else {
                levels.get_mut(x_parent).right = y;
            }
        } else {
            self.root = y;
        }
        levels.get_mut(y).left = x_left;
        if x_left != NULL_INDEX {
            levels.get_mut(x_left).parent = y;
        }

        if y_is_child {
            levels.get_mut(y).right = x;
        } else {
            levels.get_mut(y).right = x_right;
            if x_right != NULL_INDEX {
                levels.get_mut(x_right).parent = y;
            }
        }
        levels.get_mut(y).color = x_color;

        // Move x into y's position
        if y_is_child {
            levels.get_mut(x).parent = y;
        } else {
            levels.get_mut(x).parent = y_parent;
            if y_parent != NULL_INDEX {
                if levels.get(y_parent).left == y {
                    levels.get_mut(y_parent).left = x;
                } else {
                    levels.get_mut(y_parent).right = x;
                }
            }
        }
        levels.get_mut(x).left = y_left;
        if y_left != NULL_INDEX {
            levels.get_mut(y_left).parent = x;
        }
        levels.get_mut(x).right = y_right;
        if y_right != NULL_INDEX {
            levels.get_mut(y_right).parent = x;
        }
        levels.get_mut(x).color = y_color;
    }

    fn successor(levels: &Pool<PriceLevel>, t: LevelIndex) -> LevelIndex {
        if t == NULL_INDEX {
            return NULL_INDEX;
        }
        let t_right = levels.get(t).right;
        if t_right != NULL_INDEX {
            let mut p = t_right;
            while levels.get(p).left != NULL_INDEX {
                p = levels.get(p).left;
            }
            p
        } else {
            let mut p = levels.get(t).parent;
            let mut ch = t;
            while p != NULL_INDEX && ch == levels.get(p).right {
                ch = p;
                p = levels.get(p).parent;
            }
            p
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Prices in ascending order (in-order traversal).
    pub fn prices_in_order(&self, levels: &Pool<PriceLevel>) -> Vec<i64> {
        let mut out = Vec::new();
        Self::collect_in_order(levels, self.root, &mut out);
        out
    }

    fn collect_in_order(levels: &Pool<PriceLevel>, node: LevelIndex, out: &mut Vec<i64>) {
        if node == NULL_INDEX {
            return;
        }
        Self::collect_in_order(levels, levels.get(node).left, out);
        out.push(levels.get(node).price);
        Self::collect_in_order(levels, levels.get(node).right, out);
    }

    /// Check every structural rule, panicking with a description of the
    /// first violation found. Debug facility used by tests and fuzzing.
    pub fn validate(&self, levels: &Pool<PriceLevel>) {
        if self.root == NULL_INDEX {
            return;
        }
        assert!(
            levels.get(self.root).parent == NULL_INDEX,
            "root has a parent"
        );
        assert!(
            levels.get(self.root).color == Color::Black,
            "root is not black"
        );
        Self::validate_subtree(levels, self.root);

        let prices = self.prices_in_order(levels);
        for pair in prices.windows(2) {
            assert!(
                pair[0] < pair[1],
                "in-order prices not strictly increasing: {} then {}",
                pair[0],
                pair[1]
            );
        }
    }

    /// Returns the black-height of the subtree.
    fn validate_subtree(levels: &Pool<PriceLevel>, node: LevelIndex) -> u32 {
        if node == NULL_INDEX {
            return 1;
        }
        let n = levels.get(node);

        if n.color == Color::Red {
            assert!(
                Self::is_black(levels, n.left) && Self::is_black(levels, n.right),
                "red node at price {} has a red child",
                n.price
            );
        }
        if n.left != NULL_INDEX {
            assert!(
                levels.get(n.left).parent == node,
                "left child's parent link is wrong at price {}",
                n.price
            );
        }
        if n.right != NULL_INDEX {
            assert!(
                levels.get(n.right).parent == node,
                "right child's parent link is wrong at price {}",
                n.price
            );
        }

        let left_height = Self::validate_subtree(levels, n.left);
        let right_height = Self::validate_subtree(levels, n.right);
        assert!(
            left_height == right_height,
            "black-height mismatch under price {}: {} vs {}",
            n.price,
            left_height,
            right_height
        );

        left_height + if n.color == Color::Black { 1 } else { 0 }
    }
}
