//! Fire requests (F): a pending or completed firing of a transition for a
//! given token, with up to three opaque action arguments.

use std::hash::{Hash, Hasher};

use super::token::{TokenIdentity, TokenRef};
use super::transition::{ActionArg, TransitionId};

/// A request to fire `transition_id` for `token` (or, for a capacity-freed
/// cascade candidate, for no particular token), carrying up to three
/// opaque arguments for the transition's action.
///
/// Two fire requests are equal, and hash equally, when they name the same
/// transition and the same token identity; the opaque arguments play no
/// part in either. A `None` token stands for "any token will do", used by
/// capacity-freed cascade candidates.
pub struct Fire<T> {
    transition_id: TransitionId,
    token: Option<TokenRef<T>>,
    pub a: ActionArg,
    pub b: ActionArg,
    pub c: ActionArg,
}

impl<T> Fire<T> {
    pub fn new(
        transition_id: TransitionId,
        token: Option<TokenRef<T>>,
        a: ActionArg,
        b: ActionArg,
        c: ActionArg,
    ) -> Self {
        Fire {
            transition_id,
            token,
            a,
            b,
            c,
        }
    }

    /// Convenience constructor for internally generated cascade candidates,
    /// which never carry action arguments of their own.
    pub fn candidate(transition_id: TransitionId, token: Option<TokenRef<T>>) -> Self {
        Fire::new(
            transition_id,
            token,
            ActionArg::None,
            ActionArg::None,
            ActionArg::None,
        )
    }

    pub fn transition_id(&self) -> TransitionId {
        self.transition_id
    }

    pub fn token(&self) -> Option<&TokenRef<T>> {
        self.token.as_ref()
    }

    /// Identity key used by the deferred-fire store and by candidate
    /// matching: `None` for a fire request with no specific token.
    pub fn token_identity(&self) -> Option<TokenIdentity> {
        self.token.as_ref().map(TokenRef::identity)
    }
}

impl<T> Clone for Fire<T> {
    fn clone(&self) -> Self {
        Fire {
            transition_id: self.transition_id,
            token: self.token.clone(),
            a: self.a.clone(),
            b: self.b.clone(),
            c: self.c.clone(),
        }
    }
}

impl<T> PartialEq for Fire<T> {
    fn eq(&self, other: &Self) -> bool {
        self.transition_id == other.transition_id && self.token_identity() == other.token_identity()
    }
}

impl<T> Eq for Fire<T> {}

impl<T> Hash for Fire<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.transition_id.hash(state);
        self.token_identity().hash(state);
    }
}
