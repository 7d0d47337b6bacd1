//! Transitions (T): static input/output place multisets plus an optional
//! action callback. Stateless after construction.

use std::collections::HashMap;

use super::error::ActionError;
use super::place::PlaceId;

/// Identifies a transition within a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub struct TransitionId(pub usize);

/// One of the (up to three) opaque arguments passed through `queue_fire`
/// to a transition's action, unexamined by the engine. A small closed
/// tagged union covering the common argument shapes plus an escape hatch
/// for anything else, so the engine stays type-blind while callers avoid
/// unsafe downcasting for the usual cases.
#[derive(Debug, Clone, Default)]
pub enum ActionArg {
    #[default]
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Any(std::sync::Arc<dyn std::any::Any + Send + Sync>),
}

impl ActionArg {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ActionArg::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ActionArg::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn downcast_ref<U: 'static>(&self) -> Option<&U> {
        match self {
            ActionArg::Any(any) => any.downcast_ref::<U>(),
            _ => None,
        }
    }
}

impl From<i64> for ActionArg {
    fn from(v: i64) -> Self {
        ActionArg::Int(v)
    }
}

impl From<f64> for ActionArg {
    fn from(v: f64) -> Self {
        ActionArg::Float(v)
    }
}

/// The action a transition fires, receiving the consumed token's node
/// payload and the three opaque arguments supplied to `queue_fire`, in
/// call order.
///
/// Returning `Err` aborts the fire's token movement and propagates to the
/// caller of `queue_fire`; the engine never inspects the `Ok` payload.
pub type ActionFn<T> =
    Box<dyn Fn(&T, &ActionArg, &ActionArg, &ActionArg) -> Result<(), ActionError> + Send + Sync>;

/// A static transition: fixed input/output place sequences (a place may
/// repeat, denoting a required multiplicity greater than one) and an
/// optional action.
pub struct Transition<T> {
    id: TransitionId,
    inputs: Vec<PlaceId>,
    outputs: Vec<PlaceId>,
    action: Option<ActionFn<T>>,
    required_tokens: HashMap<PlaceId, usize>,
    required_capacity: HashMap<PlaceId, usize>,
}

impl<T> Transition<T> {
    pub fn new(
        id: TransitionId,
        inputs: Vec<PlaceId>,
        outputs: Vec<PlaceId>,
        action: Option<ActionFn<T>>,
    ) -> Self {
        let mut required_tokens = HashMap::new();
        for &place in &inputs {
            *required_tokens.entry(place).or_insert(0) += 1;
        }
        let mut required_capacity = HashMap::new();
        for &place in &outputs {
            *required_capacity.entry(place).or_insert(0) += 1;
        }
        Transition {
            id,
            inputs,
            outputs,
            action,
            required_tokens,
            required_capacity,
        }
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn input_places(&self) -> &[PlaceId] {
        &self.inputs
    }

    pub fn output_places(&self) -> &[PlaceId] {
        &self.outputs
    }

    /// Distinct places among the inputs, in unspecified order (order does
    /// not matter: `can_fire` checks every distinct input independently).
    pub fn distinct_input_places(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.required_tokens.keys().copied()
    }

    /// Distinct places among the outputs, in unspecified order (same
    /// rationale as [`Transition::distinct_input_places`]).
    pub fn distinct_output_places(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.required_capacity.keys().copied()
    }

    /// How many occurrences of a token this transition demands from
    /// `place_id`. Zero if `place_id` is not an input of this transition.
    pub fn required_tokens(&self, place_id: PlaceId) -> usize {
        self.required_tokens.get(&place_id).copied().unwrap_or(0)
    }

    /// How many occurrences of a token this transition deposits into
    /// `place_id`. Zero if `place_id` is not an output of this transition.
    pub fn required_capacity(&self, place_id: PlaceId) -> usize {
        self.required_capacity.get(&place_id).copied().unwrap_or(0)
    }

    pub fn action(&self) -> Option<&ActionFn<T>> {
        self.action.as_ref()
    }
}
