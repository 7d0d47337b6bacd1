//! The firing engine (FE): the core of this crate.
//!
//! Implements the enabling predicate, the atomic fire, the cascade search
//! for newly-enabled transitions after a state change, and the
//! per-transition deferred-fire bookkeeping.

use std::collections::{BTreeMap, VecDeque};

use crate::logging::Logger;

use super::error::FireError;
use super::fire::Fire;
use super::place::{Place, PlaceId};
use super::token::{TokenIdentity, TokenRef};
use super::transition::{ActionArg, Transition, TransitionId};

/// Per-transition FIFO queues of fire requests that were not enabled at
/// submission time.
///
/// The outer map is hashed with `ahash` for identity-keyed lookups; each
/// transition's bucket is a single FIFO `VecDeque` rather than a second
/// token-keyed map, which pins a deterministic resolution order for
/// simultaneously-eligible requests without giving up per-transition,
/// per-token queue semantics: a token-specific lookup simply scans the
/// deque for the first matching identity.
#[derive(Default)]
struct DeferredStore<T> {
    by_transition: std::collections::HashMap<TransitionId, VecDeque<Fire<T>>, ahash::RandomState>,
    reserve_hint: usize,
}

impl<T> DeferredStore<T> {
    fn insert(&mut self, fire: Fire<T>) {
        let queue = self.by_transition.entry(fire.transition_id()).or_default();
        if queue.capacity() == 0 && self.reserve_hint > 0 {
            queue.reserve(self.reserve_hint);
        }
        queue.push_back(fire);
    }

    /// Index of the first queued fire for `transition_id` matching
    /// `identity` (a specific token), or, when `identity` is `None`, the
    /// front of the queue (any token will do).
    fn find_index(&self, transition_id: TransitionId, identity: Option<TokenIdentity>) -> Option<usize> {
        let queue = self.by_transition.get(&transition_id)?;
        match identity {
            Some(identity) => queue.iter().position(|f| f.token_identity() == Some(identity)),
            None => (!queue.is_empty()).then_some(0),
        }
    }

    fn peek(&self, transition_id: TransitionId, index: usize) -> &Fire<T> {
        &self.by_transition[&transition_id][index]
    }

    fn remove_at(&mut self, transition_id: TransitionId, index: usize) -> Fire<T> {
        let queue = self.by_transition.get_mut(&transition_id).expect("queue must exist");
        queue.remove(index).expect("index must be valid")
    }

    fn reserve(&mut self, hint: usize) {
        self.reserve_hint = hint;
        for queue in self.by_transition.values_mut() {
            queue.reserve(hint);
        }
    }
}

/// The firing engine. Owns the net's places, transitions, and deferred
/// fire bookkeeping, and implements `can_fire`/`fire`/cascade/`queue_fire`.
///
/// `T` is the client's token payload type (the data carried by each node
/// of a token tree, see `token.rs`).
pub struct FiringEngine<T> {
    places: BTreeMap<PlaceId, Place<T>>,
    transitions: BTreeMap<TransitionId, Transition<T>>,
    deferred: DeferredStore<T>,
    logger: Logger,
}

impl<T> FiringEngine<T> {
    pub fn new(logger: Logger) -> Self {
        FiringEngine {
            places: BTreeMap::new(),
            transitions: BTreeMap::new(),
            deferred: DeferredStore::default(),
            logger,
        }
    }

    /// Creates a new place. Calling this twice with the same id is a
    /// programming error and panics.
    pub fn create_place(&mut self, id: PlaceId, capacity: Option<usize>, level: usize) {
        let previous = self.places.insert(id, Place::new(capacity, level));
        assert!(previous.is_none(), "place {id} already exists");
    }

    /// Creates a new transition. Calling this twice with the same id is a
    /// programming error and panics.
    pub fn create_transition(&mut self, transition: Transition<T>) {
        let id = transition.id();
        let previous = self.transitions.insert(id, transition);
        assert!(previous.is_none(), "transition {id} already exists");
    }

    /// Inserts `token` into `place_id` without a capacity check; this is
    /// the caller's responsibility.
    pub fn add_token(&mut self, place_id: PlaceId, token: TokenRef<T>) {
        self.place_mut(place_id).put_token(token);
    }

    /// A read-only view of the tokens currently in `place_id`.
    pub fn tokens(&self, place_id: PlaceId) -> impl Iterator<Item = (&TokenRef<T>, usize)> {
        self.place(place_id).tokens()
    }

    /// Pre-sizes the deferred-fire queues. A pure optimization; no
    /// semantic effect.
    pub fn reserve(&mut self, hint_size: usize) {
        self.deferred.reserve(hint_size);
    }

    fn place(&self, id: PlaceId) -> &Place<T> {
        self.places.get(&id).unwrap_or_else(|| panic!("unknown place {id}"))
    }

    fn place_mut(&mut self, id: PlaceId) -> &mut Place<T> {
        self.places.get_mut(&id).unwrap_or_else(|| panic!("unknown place {id}"))
    }

    fn transition(&self, id: TransitionId) -> &Transition<T> {
        self.transitions
            .get(&id)
            .unwrap_or_else(|| panic!("unknown transition {id}"))
    }

    /// Submits a fire request. If `transition_id` is currently enabled
    /// for `token`, fires it immediately and cascades; otherwise parks the
    /// request until a future state change makes it eligible.
    pub fn queue_fire(
        &mut self,
        transition_id: TransitionId,
        token: Option<TokenRef<T>>,
        a: ActionArg,
        b: ActionArg,
        c: ActionArg,
    ) -> Result<(), FireError> {
        let f = Fire::new(transition_id, token, a, b, c);
        let enabled = self.can_fire(&f);
        self.logger.log(|| {
            format!(
                "queue_fire({}) places={} transitions={} {}",
                transition_id,
                self.place_counts(),
                self.transition_counts(),
                if enabled { "can fire" } else { "cannot fire" }
            )
        });
        if !enabled {
            self.deferred.insert(f);
            return Ok(());
        }

        self.fire(&f)?;
        let mut worklist: VecDeque<Fire<T>> = self.search_next_possible_fires(&f).into();
        while let Some(candidate) = worklist.pop_front() {
            if let Some(more) = self.try_process_candidate(&candidate)? {
                worklist.extend(more);
            }
        }
        Ok(())
    }

    /// Looks up the deferred entry matching `candidate`, and if it exists
    /// and is now enabled, fires it and returns the further candidates its
    /// own firing might have unblocked. Returns `None` if there was no
    /// matching entry, or it exists but is still not enabled (it is left
    /// queued in that case).
    fn try_process_candidate(&mut self, candidate: &Fire<T>) -> Result<Option<Vec<Fire<T>>>, FireError> {
        let identity = candidate.token_identity();
        let Some(index) = self.deferred.find_index(candidate.transition_id(), identity) else {
            return Ok(None);
        };
        let enabled = self.can_fire(self.deferred.peek(candidate.transition_id(), index));
        if !enabled {
            return Ok(None);
        }
        let fire = self.deferred.remove_at(candidate.transition_id(), index);
        self.fire(&fire)?;
        Ok(Some(self.search_next_possible_fires(&fire)))
    }

    /// The enabling predicate.
    ///
    /// `token == None` is only valid for a transition with no input and no
    /// output places; there is nothing for the engine to project a
    /// missing token onto. Any other call with `token == None` is a
    /// programming error and panics.
    fn can_fire(&self, f: &Fire<T>) -> bool {
        let transition = self.transition(f.transition_id());
        let Some(token) = f.token() else {
            return transition.input_places().is_empty() && transition.output_places().is_empty();
        };

        for place_id in transition.distinct_input_places() {
            let place = self.place(place_id);
            assert!(
                token.level() <= place.level(),
                "token of level {} cannot be checked against place {} of level {}",
                token.level(),
                place_id,
                place.level()
            );
            let required = transition.required_tokens(place_id);
            for projected in token.iter(place.level()) {
                if place.count(&projected) < required {
                    return false;
                }
            }
        }

        for place_id in transition.distinct_output_places() {
            let place = self.place(place_id);
            assert!(
                token.level() <= place.level(),
                "token of level {} cannot be checked against place {} of level {}",
                token.level(),
                place_id,
                place.level()
            );
            let required = transition.required_capacity(place_id);
            let cardinality = token.iter(place.level()).count();
            if !place.has_capacity_left(cardinality * required) {
                return false;
            }
        }

        true
    }

    /// The atomic fire. Preconditions: `can_fire(f)`.
    fn fire(&mut self, f: &Fire<T>) -> Result<(), FireError> {
        self.logger.log(|| {
            format!(
                "fire({}) places={} transitions={}",
                f.transition_id(),
                self.place_counts(),
                self.transition_counts()
            )
        });

        let transition_id = f.transition_id();
        {
            let transition = self.transition(transition_id);
            if let Some(action) = transition.action() {
                let token = f
                    .token()
                    .expect("a transition with an action must be fired with a token");
                action(token.data(), &f.a, &f.b, &f.c)?;
            }
        }

        // Input/output place lists are cloned out from under the
        // transitions map so the places map can be borrowed mutably
        // alongside it without a borrow-checker conflict.
        let (inputs, outputs) = {
            let transition = self.transition(transition_id);
            (
                transition.input_places().to_vec(),
                transition.output_places().to_vec(),
            )
        };

        let token = f.token();
        for place_id in inputs {
            let token = token.expect("an input place requires a token");
            let level = self.place(place_id).level();
            let projected: Vec<_> = token.iter(level).collect();
            let place = self.place_mut(place_id);
            for c in projected {
                place.take_token(&c);
            }
        }
        for place_id in outputs {
            let token = token.expect("an output place requires a token");
            let level = self.place(place_id).level();
            let projected: Vec<_> = token.iter(level).collect();
            let place = self.place_mut(place_id);
            for c in projected {
                place.put_token(c);
            }
        }

        Ok(())
    }

    /// Enumerates candidate next fires after `f` has fired: a
    /// token-carried candidate for every transition that reads from one
    /// of `f`'s output places, and a capacity-freed candidate (no
    /// specific token) for every transition that writes to one of `f`'s
    /// finite-capacity input places.
    fn search_next_possible_fires(&self, f: &Fire<T>) -> Vec<Fire<T>> {
        let fired = self.transition(f.transition_id());
        let fired_outputs: Vec<PlaceId> = fired.output_places().to_vec();
        let fired_inputs: Vec<PlaceId> = fired.input_places().to_vec();

        let mut candidates = Vec::new();
        for (&id, candidate_transition) in &self.transitions {
            if fired_outputs
                .iter()
                .any(|p| candidate_transition.input_places().contains(p))
            {
                candidates.push(Fire::candidate(id, f.token().cloned()));
            }
            let freed_capacity = fired_inputs.iter().any(|p| {
                self.places.get(p).map(|pl| pl.capacity().is_some()).unwrap_or(false)
                    && candidate_transition.output_places().contains(p)
            });
            if freed_capacity {
                candidates.push(Fire::candidate(id, None));
            }
        }
        candidates
    }

    fn place_counts(&self) -> String {
        self.places
            .iter()
            .map(|(id, place)| format!("{id}:{}", place.len()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn transition_counts(&self) -> String {
        self.transitions
            .keys()
            .map(|id| {
                let queued = self
                    .deferred
                    .by_transition
                    .get(id)
                    .map(VecDeque::len)
                    .unwrap_or(0);
                format!("{id}:{queued}")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
