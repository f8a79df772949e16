//! MCTS configuration parameters.

use crate::constants::{
    DEFAULT_EXPLORATION, DEFAULT_ITERATIONS, DEFAULT_ROLLOUTS_PER_ITERATION, DEFAULT_THREADS,
};

/// Configuration for the tree search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsOptions {
    /// Exploration constant `c` in UCB1. Higher values favour rarely visited
    /// children over ones with a good win rate.
    pub exploration: f64,

    /// Number of select/expand/rollout/backprop cycles per move, shared by
    /// all worker threads.
    pub num_iterations: usize,

    /// Rollouts run from each selected node. Each one is backpropagated
    /// separately.
    pub num_rollouts_per_iteration: usize,

    /// Worker threads per move. 1 runs the search on the calling thread.
    pub num_threads: usize,

    /// Seed for the AI's random source; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for MctsOptions {
    fn default() -> Self {
        Self {
            exploration: DEFAULT_EXPLORATION,
            num_iterations: DEFAULT_ITERATIONS,
            num_rollouts_per_iteration: DEFAULT_ROLLOUTS_PER_ITERATION,
            num_threads: DEFAULT_THREADS,
            seed: None,
        }
    }
}

impl MctsOptions {
    /// Small, seeded, single-threaded search for tests.
    pub fn for_testing() -> Self {
        Self {
            num_iterations: 50,
            seed: Some(42),
            ..Self::default()
        }
    }

    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.num_iterations = n;
        self
    }

    pub fn with_rollouts(mut self, n: usize) -> Self {
        self.num_rollouts_per_iteration = n;
        self
    }

    /// Clamped to at least one thread.
    pub fn with_threads(mut self, n: usize) -> Self {
        self.num_threads = n.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
