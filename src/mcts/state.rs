use crate::blokus::prelude::*;
use crate::mcts::evaluator::Evaluator;
use crate::mcts::expander::NodeExpander;
use crate::mcts::gamma::Gamma;
use crate::mcts::move_list::MoveLists;
use crate::mcts::playout_features::PlayoutFeatures;
use crate::mcts::prior::{self, PriorKnowledge};
use crate::mcts::symmetry;
use crate::mcts::Float;

/// Read-only data shared by all worker states of one search.
#[derive(Clone, Debug)]
pub struct SharedConst<'c> {
    /// Frozen root position.
    pub board: Board<'c>,
    pub to_play: Color,
    /// Suppress the symmetry heuristic when we would be the copier.
    pub avoid_symmetric_draw: bool,
    /// From this many on-board pieces on, every piece is considered.
    pub min_move_all_considered: u32,
    /// Restricted piece sets for the early game, indexed by the number of
    /// on-board pieces.
    pub is_piece_considered: Vec<PieceMask>,
    pub is_piece_considered_all: PieceMask,
}

impl<'c> SharedConst<'c> {
    pub fn new(board: &Board<'c>, to_play: Color, avoid_symmetric_draw: bool) -> SharedConst<'c> {
        let bc = board.consts();
        let board_type = bc.geometry().board_type();
        let min_move_all_considered = match board_type {
            BoardType::Duo => 6,
            BoardType::Classic => 20,
            BoardType::Trigon | BoardType::Trigon3 => 28,
        };
        let all = PieceMask::all(bc.nu_pieces());
        let is_piece_considered = (0..min_move_all_considered)
            .map(|k| {
                let gate = prior::min_piece_size(board_type, k);
                let mut mask = PieceMask::empty();
                for piece in 0..bc.nu_pieces() {
                    if bc.piece_info(piece).size as usize >= gate {
                        mask.set(piece);
                    }
                }
                mask
            })
            .collect();
        SharedConst {
            board: board.clone(),
            to_play,
            avoid_symmetric_draw,
            min_move_all_considered,
            is_piece_considered,
            is_piece_considered_all: all,
        }
    }
}

/// A move for a color, as emitted by the playout policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerMove {
    pub color: Color,
    pub mv: Move,
}

/// One worker's simulation state: a private working board plus all the
/// per-color scratch that makes move generation incremental. Not thread
/// safe; every worker owns exactly one.
pub struct State<'a, 'c> {
    shared: &'a SharedConst<'c>,
    bd: Board<'c>,
    gamma: Gamma,
    features: ColorMap<PlayoutFeatures>,
    features_snapshot: ColorMap<PlayoutFeatures>,
    lists: MoveLists,
    new_moves: ColorMap<Vec<Move>>,
    prior: PriorKnowledge,
    eval: Evaluator,
    rng: fastrand::Rng,
    nu_passes: usize,
    nu_moves_initial: u32,
    has_moves: ColorMap<bool>,
    check_symmetric_draw: bool,
    check_terminate_early: bool,
    symmetry_min_nu_pieces: u32,
    is_symmetry_broken: bool,
    force_consider_all_pieces: bool,
    nu_simulations: u64,
    /// Per-state debug switch for the playout trace.
    pub log_simulations: bool,
}

impl<'a, 'c> State<'a, 'c> {
    pub fn new(shared: &'a SharedConst<'c>, seed: u64) -> State<'a, 'c> {
        let bc = shared.board.consts();
        let geo = bc.geometry();
        State {
            shared,
            bd: shared.board.clone(),
            gamma: Gamma::default(),
            features: ColorMap::from_fn(|_| PlayoutFeatures::new(geo)),
            features_snapshot: ColorMap::from_fn(|_| PlayoutFeatures::new(geo)),
            lists: MoveLists::new(bc),
            new_moves: ColorMap::default(),
            prior: PriorKnowledge::new(),
            eval: Evaluator::default(),
            rng: fastrand::Rng::with_seed(seed),
            nu_passes: 0,
            nu_moves_initial: 0,
            has_moves: ColorMap::default(),
            check_symmetric_draw: false,
            check_terminate_early: false,
            symmetry_min_nu_pieces: 0,
            is_symmetry_broken: true,
            force_consider_all_pieces: false,
            nu_simulations: 0,
            log_simulations: false,
        }
    }

    pub fn board(&self) -> &Board<'c> {
        &self.bd
    }

    pub fn nu_passes(&self) -> usize {
        self.nu_passes
    }

    pub fn is_symmetry_broken(&self) -> bool {
        self.is_symmetry_broken
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.eval
    }

    /// Idempotent per-search initialization: working board, gamma tables,
    /// feature snapshots, statistics, symmetry mode.
    pub fn start_search(&mut self) {
        let shared = self.shared;
        self.bd.copy_from(&shared.board);
        self.bd.set_to_play(shared.to_play);
        let bc = self.bd.consts();
        let variant = bc.variant();
        self.gamma = Gamma::new(bc);
        self.eval.clear();
        self.prior.start_search(&self.bd);
        self.nu_moves_initial = self.bd.nu_moves() as u32;
        self.check_terminate_early = variant.nu_players() == 2;
        self.symmetry_min_nu_pieces = if variant == Variant::Trigon2 { 5 } else { 3 };
        self.check_symmetric_draw = variant.has_symmetry_detection()
            && !(shared.avoid_symmetric_draw && shared.to_play.0 & 1 == 1)
            && !symmetry::is_root_symmetry_broken(&self.bd);
        for c in Color::all(variant.nu_colors()) {
            self.features_snapshot[c].init_snapshot(&self.bd, c);
        }
        self.bd.take_snapshot();
        self.force_consider_all_pieces = false;
        self.nu_simulations = 0;
    }

    /// Restores the root snapshot and zeroes per-simulation scratch.
    pub fn start_simulation(&mut self, n: u64) {
        if self.log_simulations {
            log::debug!("=== simulation {n} ===");
        }
        self.nu_simulations += 1;
        self.bd.restore_snapshot();
        self.bd.set_to_play(self.shared.to_play);
        self.lists.start_simulation();
        for c in Color::all(self.bd.nu_colors()) {
            self.has_moves[c] = true;
            self.features[c].copy_from(&self.features_snapshot[c]);
            self.new_moves[c].clear();
        }
        self.is_symmetry_broken = !self.check_symmetric_draw;
        // Trailing passes of the root history seed the pass counter; this
        // assumes the history alternates colors.
        self.nu_passes = 0;
        for i in (0..self.bd.nu_moves()).rev() {
            if !self.bd.get_move(i).mv.is_null() {
                break;
            }
            self.nu_passes += 1;
        }
    }

    fn considered_mask(&self) -> PieceMask {
        let shared = self.shared;
        let k = self.bd.nu_onboard_pieces();
        if self.force_consider_all_pieces || k >= shared.min_move_all_considered {
            shared.is_piece_considered_all
        } else {
            shared.is_piece_considered[k as usize]
        }
    }

    /// Brings a color's move list up to date with the working board:
    /// lazy full build on first use, incremental update afterwards.
    fn prepare_list(&mut self, c: Color) {
        if self.lists.is_initialized(c) {
            // A color whose list ran dry can never regain moves; skip it.
            if self.has_moves[c] {
                self.features[c].set_local(&self.bd, c);
                let mask = self.considered_mask();
                let mut new_moves = std::mem::take(&mut self.new_moves[c]);
                self.lists
                    .update(&self.bd, &self.features[c], &self.gamma, c, &mut new_moves, mask);
                self.new_moves[c] = new_moves;
            }
            return;
        }
        self.features[c].set_local(&self.bd, c);
        let mask = self.considered_mask();
        self.lists.init(&self.bd, &self.features[c], &self.gamma, c, mask);
        if self.lists.moves(c).is_empty()
            && !self.force_consider_all_pieces
            && mask != self.shared.is_piece_considered_all
        {
            // The restricted piece set must never retire a color that
            // still has moves.
            self.force_consider_all_pieces = true;
            self.lists
                .init(&self.bd, &self.features[c], &self.gamma, c, self.shared.is_piece_considered_all);
        }
        self.new_moves[c].clear();
    }

    /// Generates the next biased-random playout move, passing through
    /// colors without moves. Returns None when the game is over: all
    /// colors passed, a decided loss got cut short, or the mirror
    /// heuristic froze the position.
    pub fn gen_playout_move(&mut self) -> Option<PlayerMove> {
        let nu_colors = self.bd.nu_colors();
        loop {
            if self.nu_passes >= nu_colors {
                return None;
            }
            if self.check_symmetric_draw
                && !self.is_symmetry_broken
                && self.bd.nu_onboard_pieces() >= self.symmetry_min_nu_pieces
            {
                if self.log_simulations {
                    log::debug!("terminate playout: symmetry not broken");
                }
                return None;
            }
            let c = self.bd.to_play();
            self.prepare_list(c);
            self.has_moves[c] = !self.lists.moves(c).is_empty();
            if !self.has_moves[c] {
                // A playout that is already lost early in the game does
                // not need an exact score.
                if self.check_terminate_early
                    && self.nu_moves_initial < 10 * nu_colors as u32
                {
                    let second = self.bd.second_color(c);
                    if (second == c || !self.has_moves[second]) && self.bd.score(c) < 0 {
                        if self.log_simulations {
                            log::debug!("terminate early: no moves and losing");
                        }
                        return None;
                    }
                }
                self.nu_passes += 1;
                self.is_symmetry_broken = true;
                let next = self.bd.next_color(c);
                self.bd.set_to_play(next);
                continue;
            }

            let cg = self.lists.cumulative_gamma(c);
            let total = *cg.last().unwrap();
            debug_assert!(total > 0.0);
            let r = self.rng.f64() * total;
            let i = cg.partition_point(|&g| g < r).min(cg.len() - 1);
            return Some(PlayerMove { color: c, mv: self.lists.moves(c)[i] });
        }
    }

    fn play_piece(&mut self, c: Color, mv: Move) {
        self.bd.play_unchecked(c, mv);
        self.nu_passes = 0;
        let info = self.bd.consts().move_info(mv);
        let ext = self.bd.consts().move_info_ext(mv);
        for cc in Color::all(self.bd.nu_colors()) {
            let features = &mut self.features[cc];
            for &p in info.points() {
                features.set_forbidden(p);
            }
        }
        let features = &mut self.features[c];
        for &p in ext.adj_points.iter() {
            features.set_forbidden(p);
        }
        self.new_moves[c].push(mv);
        if self.check_symmetric_draw {
            symmetry::update_symmetry_broken(&self.bd, mv, c, &mut self.is_symmetry_broken);
        }
        if self.log_simulations {
            log::debug!("play {} by {}\n{}", mv.index(), c.0, self.bd);
        }
    }

    /// Applies a move produced by `gen_playout_move`.
    pub fn play_playout(&mut self, pm: PlayerMove) {
        debug_assert_eq!(pm.color, self.bd.to_play());
        self.play_piece(pm.color, pm.mv);
    }

    /// Applies a tree-selected move; a null move is a pass.
    pub fn play_expanded_child(&mut self, mv: Move) {
        let c = self.bd.to_play();
        if mv.is_null() {
            self.bd.play_pass(c);
            self.nu_passes += 1;
            self.is_symmetry_broken = true;
        } else {
            self.play_piece(c, mv);
        }
    }

    /// Expands the current position into `expander`. Returns false on
    /// capacity exhaustion; the caller proceeds without expanding.
    pub fn gen_children(&mut self, expander: &mut dyn NodeExpander, init_val: Float) -> bool {
        if self.nu_passes >= self.bd.nu_colors() {
            return true;
        }
        let c = self.bd.to_play();
        self.prepare_list(c);
        self.has_moves[c] = !self.lists.moves(c).is_empty();
        let effective_broken = !self.check_symmetric_draw || self.is_symmetry_broken;
        self.prior
            .gen_children(&self.bd, self.lists.moves(c), effective_broken, expander, init_val)
    }

    /// Maps the reached position to per-color result values.
    pub fn evaluate_playout(&mut self) -> [Float; MAX_RESULTS] {
        let symmetric_draw = self.check_symmetric_draw
            && !self.is_symmetry_broken
            && self.bd.nu_onboard_pieces() >= self.symmetry_min_nu_pieces;
        let result = self.eval.evaluate(&self.bd, symmetric_draw);
        if self.log_simulations {
            log::debug!("result: {:?}", &result[..self.bd.nu_colors()]);
        }
        result
    }

    pub fn dump(&self) -> String {
        format!(
            "to_play {} passes {} moves {}\n{}",
            self.bd.to_play().0,
            self.nu_passes,
            self.bd.nu_moves(),
            self.bd
        )
    }

    pub fn get_info(&self) -> String {
        let len = self.eval.stat_len();
        let score = self.eval.stat_score(Color(0));
        format!(
            "simulations {} len {:.1} dev {:.1} score[0] {:.1} dev {:.1}",
            self.nu_simulations,
            len.mean(),
            len.deviation(),
            score.mean(),
            score.deviation()
        )
    }
}
