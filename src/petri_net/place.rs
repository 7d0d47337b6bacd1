//! Places (P): capacity-bounded multisets of tokens at a fixed tree level.

use std::collections::HashMap;

use super::token::{TokenIdentity, TokenRef};

/// Identifies a place within a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub struct PlaceId(pub usize);

/// A capacity-bounded multiset of tokens, all interpreted relative to a
/// fixed tree level.
///
/// `capacity == None` means unbounded. `level` is the depth of token this
/// place natively holds; tokens put into it may be shallower in the
/// firing's projection sense (see `engine.rs`), but the place itself is
/// keyed at one level.
#[derive(Debug)]
pub struct Place<T> {
    capacity: Option<usize>,
    level: usize,
    // Keyed by identity rather than by `TokenRef` directly so repeated
    // lookups don't need to thread the arena `Arc` through every call.
    tokens: HashMap<TokenIdentity, (TokenRef<T>, usize), ahash::RandomState>,
    len: usize,
}

impl<T> Place<T> {
    /// Creates a new, empty place. `capacity = None` means unbounded.
    pub fn new(capacity: Option<usize>, level: usize) -> Self {
        assert!(level >= 1, "place level must be at least 1");
        Place {
            capacity,
            level,
            tokens: HashMap::default(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// `true` if `n` more tokens could be inserted without exceeding
    /// capacity. Unbounded places always have capacity left.
    pub fn has_capacity_left(&self, n: usize) -> bool {
        match self.capacity {
            None => true,
            Some(capacity) => self.len + n <= capacity,
        }
    }

    /// Inserts one occurrence of `token`.
    ///
    /// Precondition: `has_capacity_left(1)`. Violating it is a programming
    /// error and panics.
    pub fn put_token(&mut self, token: TokenRef<T>) {
        assert!(
            self.has_capacity_left(1),
            "put_token on place at capacity {:?}",
            self.capacity
        );
        let entry = self
            .tokens
            .entry(token.identity())
            .or_insert_with(|| (token, 0));
        entry.1 += 1;
        self.len += 1;
    }

    /// Removes one occurrence of `token`.
    ///
    /// Precondition: `token` is present. Violating it is a programming
    /// error and panics.
    pub fn take_token(&mut self, token: &TokenRef<T>) {
        let identity = token.identity();
        let remove_entry = match self.tokens.get_mut(&identity) {
            Some(entry) => {
                entry.1 -= 1;
                entry.1 == 0
            }
            None => panic!("take_token of a token not present in this place"),
        };
        if remove_entry {
            self.tokens.remove(&identity);
        }
        self.len -= 1;
    }

    /// The multiset count of `token` in this place.
    pub fn count(&self, token: &TokenRef<T>) -> usize {
        self.tokens
            .get(&token.identity())
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Total number of token occurrences currently in this place.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A read-only view over the distinct tokens in this place and their
    /// multiplicities.
    pub fn tokens(&self) -> impl Iterator<Item = (&TokenRef<T>, usize)> {
        self.tokens.values().map(|(token, count)| (token, *count))
    }
}
