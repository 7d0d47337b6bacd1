//! An in-process hierarchical Petri net firing engine: capacity-bounded
//! places holding tree-structured tokens, transitions consuming and
//! producing tokens projected onto each place's tree level, and a
//! deferred-fire cascade that re-evaluates parked requests whenever a
//! fire changes the net's state.
//!
//! Start at [`petri_net::net::PetriNet`]. Build a net with
//! [`PetriNet::create_place`](petri_net::net::PetriNet::create_place) and
//! [`PetriNet::create_transition`](petri_net::net::PetriNet::create_transition),
//! seed it with [`PetriNet::add_token`](petri_net::net::PetriNet::add_token),
//! and drive it with
//! [`PetriNet::queue_fire`](petri_net::net::PetriNet::queue_fire).

pub mod logging;
pub mod petri_net;

pub use petri_net::config::{ConfigError, EngineConfig};
pub use petri_net::error::{ActionError, FireError};
pub use petri_net::fire::Fire;
pub use petri_net::net::PetriNet;
pub use petri_net::place::PlaceId;
pub use petri_net::token::{TokenArena, TokenIdentity, TokenRef};
pub use petri_net::transition::{ActionArg, ActionFn, Transition, TransitionId};
