//! Search tree with arena allocation.
//!
//! Nodes live in one contiguous `Vec` and refer to each other by [`NodeId`].
//! Each node stands for a move taken from its parent's position, together
//! with the seat that made it and the statistics gathered through it.
//! Children are added once, when their parent is expanded, and never removed;
//! advancing the root rebuilds a fresh arena from the kept subtree.

use std::collections::VecDeque;

use crate::board::Move;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Parent node index (NONE for the root)
    pub parent: NodeId,
    /// Move that led here from the parent (None for a fresh root)
    pub mv: Option<Move>,
    /// Seat that made `mv`
    pub player: Option<usize>,
    /// Rollouts through this node won by `player`
    pub wins: u32,
    pub visits: u32,
    /// Empty until the node is expanded.
    pub children: Vec<NodeId>,
}

impl SearchNode {
    fn root() -> Self {
        Self {
            parent: NodeId::NONE,
            mv: None,
            player: None,
            wins: 0,
            visits: 0,
            children: Vec::new(),
        }
    }

    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn win_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins as f64 / self.visits as f64
        }
    }

    /// UCB1 score given `ln(parent visits)`. Unvisited nodes score +inf.
    #[inline]
    pub fn ucb1(&self, ln_parent_visits: f64, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        self.wins as f64 / visits + exploration * (ln_parent_visits / visits).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    /// A tree holding a single unexpanded root.
    pub fn new() -> Self {
        Self {
            nodes: vec![SearchNode::root()],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_child(&mut self, parent: NodeId, mv: Move, player: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SearchNode {
            parent,
            mv: Some(mv),
            player: Some(player),
            wins: 0,
            visits: 0,
            children: Vec::new(),
        });
        self.get_mut(parent).children.push(id);
        id
    }

    /// Pick the child with the highest UCB1 score, breaking ties uniformly
    /// at random. Unvisited children always win over visited ones.
    ///
    /// # Panics
    /// If the node has no children, or if it has never been visited while
    /// one of its children has.
    pub fn select_child(&self, id: NodeId, exploration: f64, rng: &mut fastrand::Rng) -> NodeId {
        let node = self.get(id);
        assert!(!node.children.is_empty(), "select_child on an unexpanded node");
        assert!(
            node.visits > 0 || node.children.iter().all(|&c| self.get(c).visits == 0),
            "visited child under a parent with zero visits"
        );

        let ln_parent = (node.visits.max(1) as f64).ln();
        let mut best = f64::NEG_INFINITY;
        let mut tied: Vec<NodeId> = Vec::new();
        for &child in &node.children {
            let score = self.get(child).ucb1(ln_parent, exploration);
            if score > best {
                best = score;
                tied.clear();
                tied.push(child);
            } else if score == best {
                tied.push(child);
            }
        }
        tied[rng.usize(..tied.len())]
    }

    /// Record one rollout won by seat `winner` on every node from `leaf` up
    /// to and including the root.
    pub fn backpropagate(&mut self, leaf: NodeId, winner: usize) {
        let mut current = leaf;
        while current.is_some() {
            let node = self.get_mut(current);
            node.visits += 1;
            if node.player == Some(winner) {
                node.wins += 1;
            }
            current = node.parent;
        }
    }

    /// Root child with the most visits; the first one wins ties.
    pub fn best_child(&self) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for &child in &self.get(self.root).children {
            match best {
                Some(b) if self.get(b).visits >= self.get(child).visits => {}
                _ => best = Some(child),
            }
        }
        best
    }

    pub fn find_child(&self, id: NodeId, mv: &Move) -> Option<NodeId> {
        self.get(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).mv.as_ref() == Some(mv))
    }

    /// Make `child` (a child of the root) the new root, dropping everything
    /// outside its subtree. Statistics inside the subtree are kept.
    pub fn promote(&mut self, child: NodeId) {
        assert_eq!(
            self.get(child).parent,
            self.root,
            "promoted node must be a child of the root"
        );
        let mut fresh: Vec<SearchNode> = Vec::new();
        let mut queue = VecDeque::from([(child, NodeId::NONE)]);
        while let Some((old, parent)) = queue.pop_front() {
            let id = NodeId(fresh.len() as u32);
            let node = self.get(old);
            fresh.push(SearchNode {
                parent,
                mv: node.mv,
                player: node.player,
                wins: node.wins,
                visits: node.visits,
                children: Vec::with_capacity(node.children.len()),
            });
            if parent.is_some() {
                fresh[parent.index()].children.push(id);
            }
            queue.extend(node.children.iter().map(|&c| (c, id)));
        }
        self.nodes = fresh;
        self.root = NodeId(0);
    }
}
