//! The public facade (NF): the thin, ergonomic surface clients build
//! nets and fire transitions through, hiding [`FiringEngine`]'s internals.

use crate::logging::{logger_for, Logger};

use super::config::EngineConfig;
use super::engine::FiringEngine;
use super::error::FireError;
use super::place::PlaceId;
use super::transition::{ActionArg, ActionFn, Transition, TransitionId};
use super::token::TokenRef;

/// A hierarchical Petri net: places, transitions, and the tokens moving
/// between them, with capacity-bounded enabling and a deferred-fire
/// cascade. See the crate root for the full model.
pub struct PetriNet<T> {
    engine: FiringEngine<T>,
}

impl<T> PetriNet<T> {
    /// A net with default configuration: unbounded audit-log channel
    /// capacity of 200 messages, logging discarded rather than written to
    /// a file.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let logger = config
            .log_folder
            .as_deref()
            .map(|folder| logger_for(Some(folder), config.log_channel_capacity))
            .unwrap_or_else(Logger::noop);
        let mut engine = FiringEngine::new(logger);
        if config.deferred_shard_hint > 0 {
            engine.reserve(config.deferred_shard_hint);
        }
        PetriNet { engine }
    }

    /// Creates a place. `capacity = None` means unbounded; `level` is the
    /// tree depth of token this place natively holds (root = 1).
    pub fn create_place(&mut self, place_id: PlaceId, capacity: Option<usize>, level: usize) {
        self.engine.create_place(place_id, capacity, level);
    }

    /// Creates a transition with no action: firing it only moves tokens.
    pub fn create_transition(&mut self, transition_id: TransitionId, inputs: Vec<PlaceId>, outputs: Vec<PlaceId>) {
        self.engine
            .create_transition(Transition::new(transition_id, inputs, outputs, None));
    }

    /// Creates a transition whose action runs against the consumed
    /// token's node payload, before any tokens move.
    pub fn create_transition_with_action(
        &mut self,
        transition_id: TransitionId,
        inputs: Vec<PlaceId>,
        outputs: Vec<PlaceId>,
        action: ActionFn<T>,
    ) {
        self.engine
            .create_transition(Transition::new(transition_id, inputs, outputs, Some(action)));
    }

    /// Inserts `token` into `place_id`, bypassing capacity and enabling
    /// checks; this is the caller's responsibility.
    pub fn add_token(&mut self, place_id: PlaceId, token: TokenRef<T>) {
        self.engine.add_token(place_id, token);
    }

    /// Submits a fire request: fires immediately (and cascades) if
    /// `transition_id` is enabled for `token`, otherwise parks it until a
    /// later state change enables it.
    pub fn queue_fire(
        &mut self,
        transition_id: TransitionId,
        token: Option<TokenRef<T>>,
        a: ActionArg,
        b: ActionArg,
        c: ActionArg,
    ) -> Result<(), FireError> {
        self.engine.queue_fire(transition_id, token, a, b, c)
    }

    /// The tokens currently in `place_id` and their multiplicities.
    pub fn tokens(&self, place_id: PlaceId) -> impl Iterator<Item = (&TokenRef<T>, usize)> {
        self.engine.tokens(place_id)
    }

    /// Pre-sizes the deferred-fire queues; a pure optimization.
    pub fn reserve(&mut self, hint_size: usize) {
        self.engine.reserve(hint_size);
    }
}

impl<T> Default for PetriNet<T> {
    fn default() -> Self {
        Self::new()
    }
}
