//! Monte Carlo Tree Search (MCTS) player.
//!
//! Each iteration:
//! 1. **Select**: walk down from the root with UCB1, replaying the moves on a
//!    private copy of the game. An unexpanded node is expanded only once its
//!    parent has been visited at least as many times as it has children, so
//!    every sibling gets one rollout before UCB1 compares them.
//! 2. **Expand**: add one child per legal move, or a single pass child.
//! 3. **Rollout**: play random moves to the end of the game.
//! 4. **Backpropagate**: credit the winning seat on the path up to the root.
//!
//! Worker threads share one tree behind a single mutex. The lock is held
//! while selecting and expanding and while backpropagating, never during a
//! rollout. An atomic counter hands out exactly `num_iterations` iterations
//! across all workers.
//!
//! The tree is kept between moves: when the game has advanced, the child
//! matching each new move becomes the root.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::board::Move;
use crate::config::MctsOptions;
use crate::game::Game;
use crate::playout::rollout;
use crate::runner::Player;
use crate::tree::{NodeId, SearchTree};

pub struct MctsAi {
    options: MctsOptions,
    tree: SearchTree,
    /// Number of game moves the tree root already accounts for.
    synced: usize,
    rng: fastrand::Rng,
}

impl MctsAi {
    pub fn new(options: MctsOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            options,
            tree: SearchTree::new(),
            synced: 0,
            rng,
        }
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Advance the root past every move played since the last call.
    ///
    /// The tree is rebuilt from scratch when the game restarted, when the root
    /// was never expanded, or when a played move is not among the root's
    /// children. The last case is a voluntary pass: expansion only generates a
    /// pass when the color has no placement left, so a pass made with
    /// placements available is unknown to the tree and is logged with `warn!`.
    fn sync(&mut self, game: &Game) {
        let moves = game.moves();
        if moves.len() < self.synced {
            debug!("game restarted, discarding search tree");
            self.tree = SearchTree::new();
            self.synced = 0;
        }
        for mv in &moves[self.synced..] {
            let root = self.tree.root();
            if !self.tree.get(root).is_expanded() {
                self.tree = SearchTree::new();
                break;
            }
            match self.tree.find_child(root, mv) {
                Some(child) => self.tree.promote(child),
                None => {
                    warn!(%mv, "played move not in search tree, discarding it");
                    self.tree = SearchTree::new();
                    break;
                }
            }
        }
        self.synced = moves.len();
    }

    /// Run the configured number of iterations from the game's position.
    pub fn search(&mut self, game: &Game) {
        self.sync(game);
        let start = Instant::now();
        let num_threads = self.options.num_threads.max(1);
        let counter = AtomicUsize::new(0);
        let shared = Mutex::new(std::mem::take(&mut self.tree));

        if num_threads == 1 {
            let mut rng = fastrand::Rng::with_seed(self.rng.u64(..));
            run_worker(&shared, &counter, game, &self.options, &mut rng);
        } else {
            let seeds: Vec<u64> = (0..num_threads).map(|_| self.rng.u64(..)).collect();
            let (shared, counter, options) = (&shared, &counter, &self.options);
            thread::scope(|s| {
                for seed in seeds {
                    s.spawn(move || {
                        let mut rng = fastrand::Rng::with_seed(seed);
                        run_worker(shared, counter, game, options, &mut rng);
                    });
                }
            });
        }

        self.tree = shared.into_inner().unwrap_or_else(|e| e.into_inner());
        let root = self.tree.get(self.tree.root());
        debug!(
            iterations = self.options.num_iterations,
            threads = num_threads,
            nodes = self.tree.len(),
            root_visits = root.visits,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );
    }

    /// The most visited root move, if the root has been expanded.
    pub fn best_move(&self) -> Option<Move> {
        self.tree.best_child().and_then(|id| self.tree.get(id).mv)
    }

    fn log_root(&self) {
        for &id in &self.tree.get(self.tree.root()).children {
            let node = self.tree.get(id);
            if let Some(mv) = node.mv {
                trace!(%mv, visits = node.visits, win_rate = node.win_rate(), "root child");
            }
        }
    }
}

impl Player for MctsAi {
    fn select_move(&mut self, game: &Game) -> Move {
        if game.is_finished() {
            return Move::pass(game.current_color());
        }
        self.sync(game);

        let root = self.tree.root();
        if !self.tree.get(root).is_expanded() {
            expand(&mut self.tree, root, &mut game.clone());
        }
        if let [only] = self.tree.get(root).children.as_slice() {
            if let Some(mv) = self.tree.get(*only).mv {
                debug!(%mv, "forced move");
                return mv;
            }
        }

        self.search(game);
        self.log_root();
        self.best_move()
            .unwrap_or_else(|| Move::pass(game.current_color()))
    }
}

fn lock(tree: &Mutex<SearchTree>) -> MutexGuard<'_, SearchTree> {
    tree.lock().unwrap_or_else(|e| e.into_inner())
}

fn run_worker(
    shared: &Mutex<SearchTree>,
    counter: &AtomicUsize,
    game: &Game,
    options: &MctsOptions,
    rng: &mut fastrand::Rng,
) {
    while counter.fetch_add(1, Ordering::Relaxed) < options.num_iterations {
        let mut state = game.clone();
        let leaf = select_leaf(&mut lock(shared), &mut state, options.exploration, rng);
        for _ in 0..options.num_rollouts_per_iteration {
            let winner = rollout(&mut state.clone(), rng);
            lock(shared).backpropagate(leaf, winner);
        }
    }
}

/// Add one child per legal move of the color to play, or a lone pass.
fn expand(tree: &mut SearchTree, node: NodeId, game: &mut Game) {
    let player = game.current_player();
    let moves = game.legal_moves();
    if moves.is_empty() {
        tree.add_child(node, Move::pass(game.current_color()), player);
        return;
    }
    for mv in moves {
        tree.add_child(node, mv, player);
    }
}

/// Walk from the root to the node the next rollout starts from, applying
/// each chosen move to `game`.
fn select_leaf(
    tree: &mut SearchTree,
    game: &mut Game,
    exploration: f64,
    rng: &mut fastrand::Rng,
) -> NodeId {
    let mut node = tree.root();
    loop {
        if game.is_finished() {
            return node;
        }
        if !tree.get(node).is_expanded() {
            let parent = tree.get(node).parent;
            if parent.is_some() {
                let p = tree.get(parent);
                if (p.visits as usize) < p.children.len() {
                    return node;
                }
            }
            expand(tree, node, game);
        }
        node = tree.select_child(node, exploration, rng);
        let Some(mv) = tree.get(node).mv else {
            panic!("search node without a move below the root");
        };
        if let Err(e) = game.make_move(mv) {
            panic!("search tree move {mv} rejected: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::constants::MONOMINO;
    use crate::piece::Placement;

    fn home_monomino(color: Color) -> Move {
        let home = color.home_slot().coord;
        Move::place(color, MONOMINO, Placement::new(home.row, home.col, 0, false))
    }

    #[test]
    fn test_opening_move_is_legal() {
        let game = Game::with_players(2).unwrap();
        let mut ai = MctsAi::new(MctsOptions::for_testing().with_iterations(20));
        let mv = ai.select_move(&game);
        assert!(game.is_legal(&mv));
        assert_eq!(mv.color, Color::Blue);
    }

    #[test]
    fn test_forced_pass_skips_search() {
        let mut game = Game::new();
        game.make_move(Move::pass(Color::Blue)).unwrap();
        for color in [Color::Yellow, Color::Red, Color::Green] {
            game.make_move(home_monomino(color)).unwrap();
        }
        let mut ai = MctsAi::new(MctsOptions::for_testing());
        assert_eq!(ai.select_move(&game), Move::pass(Color::Blue));
        assert_eq!(ai.tree().get(ai.tree().root()).visits, 0);
    }

    #[test]
    fn test_root_visits_match_iterations() {
        let game = Game::with_players(2).unwrap();
        let mut ai = MctsAi::new(
            MctsOptions::for_testing()
                .with_iterations(24)
                .with_rollouts(2)
                .with_threads(3),
        );
        ai.search(&game);
        let tree = ai.tree();
        assert_eq!(tree.get(tree.root()).visits, 48);
    }

    #[test]
    fn test_best_move_has_most_visits() {
        let game = Game::with_players(2).unwrap();
        let mut ai = MctsAi::new(MctsOptions::for_testing().with_iterations(30));
        ai.search(&game);
        let tree = ai.tree();
        let root = tree.get(tree.root());
        let max = root.children.iter().map(|&c| tree.get(c).visits).max();
        let best = tree.best_child().unwrap();
        assert_eq!(Some(tree.get(best).visits), max);
        assert_eq!(ai.best_move(), tree.get(best).mv);
    }

    #[test]
    fn test_tree_follows_played_moves() {
        let mut game = Game::with_players(2).unwrap();
        let mut ai = MctsAi::new(MctsOptions::for_testing().with_iterations(30));
        let mv = ai.select_move(&game);
        game.make_move(mv).unwrap();

        ai.sync(&game);
        let tree = ai.tree();
        let root = tree.get(tree.root());
        assert_eq!(root.mv, Some(mv));
        assert!(root.visits > 0);
        assert!(root.parent.is_none());
    }

    #[test]
    fn test_unknown_move_resets_tree() {
        let mut game = Game::with_players(2).unwrap();
        let mut ai = MctsAi::new(MctsOptions::for_testing().with_iterations(10));
        ai.search(&game);
        // Voluntary pass: never generated while legal placements exist.
        game.make_move(Move::pass(Color::Blue)).unwrap();
        ai.sync(&game);
        assert_eq!(ai.tree().len(), 1);
    }

    #[test]
    fn test_same_seed_same_moves() {
        let play = || {
            let mut game = Game::with_players(2).unwrap();
            let mut ai = MctsAi::new(MctsOptions::for_testing().with_iterations(15));
            for _ in 0..3 {
                let mv = ai.select_move(&game);
                game.make_move(mv).unwrap();
            }
            game.moves().to_vec()
        };
        assert_eq!(play(), play());
    }
}
