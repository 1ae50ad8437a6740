/*
 *  The per-simulation search core: incremental move lists, playout
 *  biasing, prior knowledge for node expansion, symmetry detection, and
 *  terminal evaluation.
 */

pub mod evaluator;
pub mod expander;
pub mod gamma;
pub mod move_list;
pub mod move_marker;
pub mod playout_features;
pub mod prior;
pub mod state;
pub mod symmetry;

/// Value type for node statistics and evaluation results. Cumulative
/// gamma weights use f64 because they span many orders of magnitude.
pub type Float = f32;

pub mod prelude {
    pub use super::{
        evaluator::{fast_sigmoid, Evaluator, Statistics},
        expander::{ChildBuffer, NodeExpander},
        gamma::Gamma,
        move_list::MoveLists,
        move_marker::MoveMarker,
        playout_features::{Compute, PlayoutFeatures},
        prior::PriorKnowledge,
        state::{PlayerMove, SharedConst, State},
        Float,
    };
}
