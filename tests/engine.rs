//! End-to-end firing-engine scenarios: a linear chain of transitions
//! firing in cascade order, capacity-driven deferral, duplicate-arc
//! multiplicities, level-up/level-down token projection, and a
//! self-loop transition.

use std::sync::{Arc, Mutex};

use petri_nets::{ActionArg, PetriNet, PlaceId, TokenArena, TokenRef, TransitionId};

/// Surfaces the engine's `tracing` events (see `src/logging.rs`) when
/// these tests are run with `RUST_LOG` set; a no-op otherwise since
/// `try_init` only ever succeeds once per process.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn leaf_token() -> TokenRef<()> {
    let mut builder = TokenArena::builder();
    builder.add_node((), None);
    builder.build()
}

fn two_child_token() -> TokenRef<()> {
    let mut builder = TokenArena::builder();
    let root = builder.add_node((), None);
    builder.add_node((), Some(root));
    builder.add_node((), Some(root));
    builder.build()
}

fn sum_of_counts<T>(net: &PetriNet<T>, place: PlaceId) -> usize {
    net.tokens(place).map(|(_, count)| count).sum()
}

/// Queueing the downstream transitions of a chain before the upstream
/// one has moved its token defers all three; firing the first transition
/// cascades through the whole chain in order.
#[test]
fn linear_chain_fires_in_cascade_order_once_enabled() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    for place in 1..=5 {
        net.create_place(PlaceId(place), None, 1);
    }

    let order: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    for (transition, step) in [(1, 1u32), (2, 2), (3, 3), (4, 4)] {
        let order = Arc::clone(&order);
        net.create_transition_with_action(
            TransitionId(transition),
            vec![PlaceId(transition)],
            vec![PlaceId(transition + 1)],
            Box::new(move |_token: &(), _a, _b, _c| {
                order.lock().unwrap().push(step);
                Ok(())
            }),
        );
    }

    let token = leaf_token();
    net.add_token(PlaceId(1), token.clone());

    net.queue_fire(TransitionId(2), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    net.queue_fire(TransitionId(3), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    net.queue_fire(TransitionId(4), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert!(order.lock().unwrap().is_empty(), "nothing should have fired yet");

    net.queue_fire(TransitionId(1), Some(token), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3, 4]);
}

/// A single-slot place forces one of two competing requests to park;
/// freeing the slot by firing the other request's consumer cascades into
/// the parked one automatically.
#[test]
fn capacity_limited_place_defers_until_a_slot_frees_up() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    net.create_place(PlaceId(1), None, 1);
    net.create_place(PlaceId(2), Some(1), 1);
    net.create_place(PlaceId(3), None, 1);
    net.create_transition(TransitionId(1), vec![PlaceId(1)], vec![PlaceId(2)]);
    net.create_transition(TransitionId(2), vec![PlaceId(2)], vec![PlaceId(3)]);

    let token1 = leaf_token();
    let token2 = leaf_token();
    net.add_token(PlaceId(1), token1.clone());
    net.add_token(PlaceId(1), token2.clone());

    net.queue_fire(TransitionId(1), Some(token1.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    net.queue_fire(TransitionId(1), Some(token2.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 1, "place 2 only has room for one token");

    net.queue_fire(TransitionId(2), Some(token2.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    net.queue_fire(TransitionId(2), Some(token1), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();

    assert_eq!(sum_of_counts(&net, PlaceId(1)), 0);
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 0);
    assert_eq!(sum_of_counts(&net, PlaceId(3)), 2);
    let _ = token2;
}

/// A transition with a duplicate output arc deposits two occurrences of
/// the same token in one fire; a duplicate input arc symmetrically
/// drains two occurrences.
#[test]
fn duplicate_arcs_move_tokens_in_multiples() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    net.create_place(PlaceId(1), None, 1);
    net.create_place(PlaceId(2), None, 1);
    net.create_transition(TransitionId(1), vec![], vec![PlaceId(1), PlaceId(1)]);
    net.create_transition(TransitionId(2), vec![PlaceId(1)], vec![PlaceId(2)]);

    let token = leaf_token();
    net.queue_fire(TransitionId(1), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(1)), 2);

    net.queue_fire(TransitionId(2), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(1)), 1);
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 1);

    net.queue_fire(TransitionId(2), Some(token), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(1)), 0);
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 2);
}

/// A place at level 2 holding two child tokens is consumed by a
/// transition whose fire request names their shared level-1 parent; the
/// parent token is what gets produced into the level-1 output place.
#[test]
fn consuming_two_child_tokens_produces_their_parent() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    net.create_place(PlaceId(1), None, 2);
    net.create_place(PlaceId(2), Some(2), 1);

    let target = Arc::new(Mutex::new(0));
    let target_in_action = Arc::clone(&target);
    net.create_transition_with_action(
        TransitionId(1),
        vec![PlaceId(1)],
        vec![PlaceId(2)],
        Box::new(move |_token: &(), a, _b, _c| {
            *target_in_action.lock().unwrap() += a.as_int().unwrap_or(0);
            Ok(())
        }),
    );

    let parent = two_child_token();
    net.add_token(PlaceId(1), parent.child(0));
    net.add_token(PlaceId(1), parent.child(1));

    net.queue_fire(TransitionId(1), Some(parent.clone()), ActionArg::Int(5), ActionArg::None, ActionArg::None)
        .unwrap();

    assert_eq!(sum_of_counts(&net, PlaceId(1)), 0);
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 1);
    assert!(net.tokens(PlaceId(2)).any(|(t, _)| *t == parent));
    assert_eq!(*target.lock().unwrap(), 5);
}

/// The inverse of the above: a level-1 token is consumed and its two
/// direct children are produced into a level-2 place.
#[test]
fn firing_with_a_parent_token_produces_its_children() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    net.create_place(PlaceId(1), None, 1);
    net.create_place(PlaceId(2), Some(2), 2);
    net.create_transition(TransitionId(1), vec![PlaceId(1)], vec![PlaceId(2)]);

    let parent = two_child_token();
    net.add_token(PlaceId(1), parent.clone());

    net.queue_fire(TransitionId(1), Some(parent.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();

    assert_eq!(sum_of_counts(&net, PlaceId(1)), 0);
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 2);
    assert!(net.tokens(PlaceId(2)).any(|(t, _)| *t == parent.child(0)));
    assert!(net.tokens(PlaceId(2)).any(|(t, _)| *t == parent.child(1)));
}

/// A duplicate output arc requires capacity for both occurrences at once:
/// firing twice against a capacity-3 place succeeds once and then parks,
/// since the second fire would need two more slots than remain.
#[test]
fn duplicate_output_arc_capacity_check_rejects_the_second_fire() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    net.create_place(PlaceId(1), None, 1);
    net.create_place(PlaceId(2), Some(3), 1);
    net.create_transition(TransitionId(1), vec![PlaceId(1)], vec![PlaceId(2), PlaceId(2)]);

    let token = leaf_token();
    net.add_token(PlaceId(1), token.clone());
    net.add_token(PlaceId(1), token.clone());

    net.queue_fire(TransitionId(1), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 2, "first fire deposits two occurrences");

    net.queue_fire(TransitionId(1), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(1)), 1, "second fire parked: place 2 has no room for two more");
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 2);
    let _ = token;
}

/// The action runs before token movement, so a failing action leaves
/// that fire's own tokens unmoved.
#[test]
fn a_failing_action_leaves_that_fires_tokens_unmoved() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    net.create_place(PlaceId(1), None, 1);
    net.create_place(PlaceId(2), None, 1);
    net.create_transition_with_action(
        TransitionId(1),
        vec![PlaceId(1)],
        vec![PlaceId(2)],
        Box::new(|_token: &(), _a, _b, _c| {
            Err(petri_nets::ActionError::Failed("refused".into()))
        }),
    );

    let token = leaf_token();
    net.add_token(PlaceId(1), token.clone());

    let result = net.queue_fire(TransitionId(1), Some(token), ActionArg::None, ActionArg::None, ActionArg::None);
    assert!(result.is_err());
    assert_eq!(sum_of_counts(&net, PlaceId(1)), 1, "token must not have moved out of place 1");
    assert_eq!(sum_of_counts(&net, PlaceId(2)), 0);
}

/// A transition whose only place is both its input and its output.
/// Queueing it before the token exists defers it; queueing it again
/// afterward fires a self-loop that leaves the place's content
/// unchanged.
#[test]
fn self_loop_transition_fires_without_net_change() {
    init_tracing();
    let mut net: PetriNet<()> = PetriNet::new();
    net.create_place(PlaceId(1), None, 1);
    net.create_transition(TransitionId(1), vec![PlaceId(1)], vec![PlaceId(1)]);

    let token = leaf_token();
    net.queue_fire(TransitionId(1), Some(token.clone()), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(1)), 0, "still deferred: the token isn't in the place yet");

    net.add_token(PlaceId(1), token.clone());
    net.queue_fire(TransitionId(1), Some(token), ActionArg::None, ActionArg::None, ActionArg::None)
        .unwrap();
    assert_eq!(sum_of_counts(&net, PlaceId(1)), 1);
}
