use crate::blokus::prelude::*;
use crate::mcts::Float;

/// Sink for freshly expanded children. The tree side owns the node
/// storage; the core only reports moves with their prior (value, count)
/// initialization.
pub trait NodeExpander {
    /// Whether the tree can still hold `nu_children` more nodes.
    fn has_capacity(&self, nu_children: usize) -> bool;

    fn add_child(&mut self, mv: Move, value: Float, count: Float);
}

/// A plain vector-backed expander for tests and the self-play driver.
#[derive(Clone, Debug)]
pub struct ChildBuffer {
    pub children: Vec<(Move, Float, Float)>,
    capacity: usize,
}

impl ChildBuffer {
    pub fn new(capacity: usize) -> ChildBuffer {
        ChildBuffer { children: vec![], capacity }
    }
}

impl NodeExpander for ChildBuffer {
    fn has_capacity(&self, nu_children: usize) -> bool {
        self.children.len() + nu_children <= self.capacity
    }

    fn add_child(&mut self, mv: Move, value: Float, count: Float) {
        self.children.push((mv, value, count));
    }
}
