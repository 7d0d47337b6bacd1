//! The hierarchical token tree (TT).
//!
//! A token is a node in an immutable tree. Tokens are addressed by
//! identity, not by value: two [`TokenRef`]s are equal iff they name the
//! same node of the same tree. The tree itself lives in a [`TokenArena`],
//! shared by every [`TokenRef`] derived from it; the arena is freed once
//! the last reference to it is dropped.

use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Index of a node within a [`TokenArena`].
type NodeIndex = usize;

/// One node of a token tree: the client-supplied payload plus the indices
/// of its children within the owning arena.
#[derive(Debug)]
struct TokenNode<T> {
    data: T,
    children: Vec<NodeIndex>,
}

/// An immutable arena of token-tree nodes, built once and then shared by
/// every [`TokenRef`] that addresses into it.
#[derive(Debug)]
pub struct TokenArena<T> {
    nodes: Vec<TokenNode<T>>,
}

impl<T> TokenArena<T> {
    /// Starts building a new arena, returning a builder.
    pub fn builder() -> TokenArenaBuilder<T> {
        TokenArenaBuilder { nodes: Vec::new() }
    }

    fn arity(&self, index: NodeIndex) -> usize {
        self.nodes[index].children.len()
    }

    fn child_index(&self, index: NodeIndex, i: usize) -> NodeIndex {
        self.nodes[index].children[i]
    }

    fn data(&self, index: NodeIndex) -> &T {
        &self.nodes[index].data
    }
}

/// Incrementally constructs a [`TokenArena`].
///
/// Nodes are appended depth-first or breadth-first, whichever the caller
/// prefers; each node names its parent (or `None` for the root).
pub struct TokenArenaBuilder<T> {
    nodes: Vec<TokenNode<T>>,
}

impl<T> TokenArenaBuilder<T> {
    /// Adds a node with the given payload and optional parent, returning
    /// its index. The first node added (parent `None`) becomes the root.
    pub fn add_node(&mut self, data: T, parent: Option<NodeIndex>) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(TokenNode {
            data,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(index);
        }
        index
    }

    /// Finishes the arena and returns a [`TokenRef`] to its root (level 1).
    ///
    /// Panics if no node was ever added.
    pub fn build(self) -> TokenRef<T> {
        assert!(!self.nodes.is_empty(), "token arena must have a root node");
        TokenRef {
            arena: Arc::new(TokenArena { nodes: self.nodes }),
            index: 0,
            level: 1,
        }
    }
}

/// A tree pointer: names one node of a token tree, together with a
/// shared-ownership handle on the whole tree and the node's depth (root =
/// 1). Two [`TokenRef`]s are equal iff they address the same node of the
/// same arena (pointer identity, not structural equality).
pub struct TokenRef<T> {
    arena: Arc<TokenArena<T>>,
    index: NodeIndex,
    level: usize,
}

impl<T> TokenRef<T> {
    /// The node's depth in its tree; the root is level 1.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The number of direct children of this node.
    pub fn arity(&self) -> usize {
        self.arena.arity(self.index)
    }

    /// The `i`-th direct child, one level deeper, sharing root ownership.
    pub fn child(&self, i: usize) -> TokenRef<T> {
        TokenRef {
            arena: Arc::clone(&self.arena),
            index: self.arena.child_index(self.index, i),
            level: self.level + 1,
        }
    }

    /// Borrows the client payload at this node.
    pub fn data(&self) -> &T {
        self.arena.data(self.index)
    }

    /// A restartable, finite, breadth-first (level-order) traversal of all
    /// nodes at depth exactly `level` within the subtree rooted at this
    /// token. Empty if `level < self.level()`; yields `{self}` if `level
    /// == self.level()`.
    pub fn iter(&self, level: usize) -> TokenLevelIter<'_, T> {
        TokenLevelIter {
            arena: &self.arena,
            target_level: level,
            queue: if level >= self.level {
                VecDeque::from([(self.index, self.level)])
            } else {
                VecDeque::new()
            },
        }
    }

    /// A stable identity key suitable for use as a hash map key; two
    /// tokens produce equal keys iff [`TokenRef::eq`] would return true.
    pub fn identity(&self) -> TokenIdentity {
        TokenIdentity {
            arena: Arc::as_ptr(&self.arena) as usize,
            index: self.index,
        }
    }
}

impl<T> Clone for TokenRef<T> {
    fn clone(&self) -> Self {
        TokenRef {
            arena: Arc::clone(&self.arena),
            index: self.index,
            level: self.level,
        }
    }
}

impl<T> fmt::Debug for TokenRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRef")
            .field("index", &self.index)
            .field("level", &self.level)
            .finish()
    }
}

impl<T> PartialEq for TokenRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.arena, &other.arena) && self.index == other.index
    }
}

impl<T> Eq for TokenRef<T> {}

impl<T> Hash for TokenRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// A copyable, `'static` identity for a [`TokenRef`], used as a hash-map
/// key where holding the full `Arc` isn't necessary (e.g. the deferred-fire
/// store keys on this rather than on a full `TokenRef` clone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenIdentity {
    arena: usize,
    index: NodeIndex,
}

/// Iterator returned by [`TokenRef::iter`]: a level-order (breadth-first)
/// walk of a subtree, filtered to one target depth.
pub struct TokenLevelIter<'a, T> {
    arena: &'a Arc<TokenArena<T>>,
    target_level: usize,
    queue: VecDeque<(NodeIndex, usize)>,
}

impl<'a, T> Iterator for TokenLevelIter<'a, T> {
    type Item = TokenRef<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, level)) = self.queue.pop_front() {
            if level == self.target_level {
                return Some(TokenRef {
                    arena: Arc::clone(self.arena),
                    index,
                    level,
                });
            }
            // level < target_level here since anything deeper was never enqueued
            for i in 0..self.arena.arity(index) {
                self.queue
                    .push_back((self.arena.child_index(index, i), level + 1));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_child_tree() -> TokenRef<&'static str> {
        let mut builder = TokenArena::builder();
        let root = builder.add_node("root", None);
        builder.add_node("left", Some(root));
        builder.add_node("right", Some(root));
        builder.build()
    }

    #[test]
    fn root_is_level_one() {
        let root = two_child_tree();
        assert_eq!(root.level(), 1);
        assert_eq!(root.arity(), 2);
    }

    #[test]
    fn children_share_ownership_and_are_level_two() {
        let root = two_child_tree();
        let left = root.child(0);
        let right = root.child(1);
        assert_eq!(left.level(), 2);
        assert_eq!(*left.data(), "left");
        assert_eq!(*right.data(), "right");
        assert_ne!(left, right);
    }

    #[test]
    fn identity_equality_not_value_equality() {
        let root = two_child_tree();
        let left_a = root.child(0);
        let left_b = root.child(0);
        assert_eq!(left_a, left_b, "same node fetched twice must compare equal");
    }

    #[test]
    fn iter_below_level_is_empty() {
        let root = two_child_tree();
        let left = root.child(0);
        assert_eq!(left.iter(1).count(), 0);
    }

    #[test]
    fn iter_at_own_level_yields_self() {
        let root = two_child_tree();
        let found: Vec<_> = root.iter(1).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], root);
    }

    #[test]
    fn iter_is_breadth_first_and_restartable() {
        let root = two_child_tree();
        let first_pass: Vec<_> = root.iter(2).map(|t| *t.data()).collect();
        let second_pass: Vec<_> = root.iter(2).map(|t| *t.data()).collect();
        assert_eq!(first_pass, vec!["left", "right"]);
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn iter_descends_multiple_levels() {
        let mut builder = TokenArena::builder();
        let root = builder.add_node(0, None);
        let mid = builder.add_node(1, Some(root));
        builder.add_node(2, Some(mid));
        builder.add_node(3, Some(mid));
        let root = builder.build();
        let leaves: Vec<_> = root.iter(3).map(|t| *t.data()).collect();
        assert_eq!(leaves, vec![2, 3]);
    }
}
