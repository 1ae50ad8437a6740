use crate::blokus::prelude::*;
use crate::mcts::evaluator::fast_sigmoid;
use crate::mcts::expander::NodeExpander;
use crate::mcts::Float;

/// Smallest piece size worth expanding at a given stage of the game. The
/// same gates drive the restricted piece-consideration masks of the
/// playout policy.
pub(crate) fn min_piece_size(board_type: BoardType, nu_onboard: u32) -> usize {
    match board_type {
        BoardType::Duo => match nu_onboard {
            0..4 => 5,
            4..6 => 4,
            _ => 0,
        },
        BoardType::Classic => match nu_onboard {
            0..12 => 5,
            12..20 => 4,
            _ => 0,
        },
        BoardType::Trigon | BoardType::Trigon3 => match nu_onboard {
            0..16 => 6,
            16..20 => 5,
            20..28 => 4,
            _ => 0,
        },
    }
}

/// The piece count up to which central moves are favored.
fn check_dist_to_center(board_type: BoardType, nu_onboard: u32) -> bool {
    match board_type {
        BoardType::Classic => nu_onboard < 13,
        BoardType::Trigon | BoardType::Trigon3 => nu_onboard < 5,
        BoardType::Duo => false,
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct MoveFeatures {
    /// Heuristic value of the move expressed in score points.
    heuristic: Float,
    /// Does the move touch a piece of the same player (the partner color
    /// in two-colors-per-player variants)?
    connect: bool,
    dist_to_center: f32,
}

/// Initializes freshly expanded children with heuristic (value, count)
/// priors derived from move size, locality, connectivity, centrality,
/// and the symmetry race.
#[derive(Clone, Debug, Default)]
pub struct PriorKnowledge {
    features: Vec<MoveFeatures>,
    max_heuristic: Float,
    min_dist_to_center: f32,
    has_connect_move: bool,
    /// Marker for attach points of recent opponent moves.
    is_local: Option<Grid<bool>>,
    local_points: Vec<Point>,
    dist_to_center: Option<Grid<f32>>,
}

impl PriorKnowledge {
    pub fn new() -> PriorKnowledge {
        PriorKnowledge::default()
    }

    pub fn start_search(&mut self, bd: &Board<'_>) {
        let geo = bd.consts().geometry();
        let ratio = geo.board_type().y_ratio();
        let center_x = 0.5 * (geo.width() - 1) as f32;
        let center_y = 0.5 * (geo.height() - 1) as f32;
        let mut dist = Grid::new(geo, 0.0f32);
        for p in geo.iter() {
            let (x, y) = geo.coord(p);
            let dx = x as f32 - center_x;
            let dy = ratio * (y as f32 - center_y);
            // Scaled by 4 so distances within a quarter cell tie.
            dist[p] = (4.0 * (dx * dx + dy * dy).sqrt()).round();
        }
        self.dist_to_center = Some(dist);
        self.is_local = Some(Grid::new(geo, false));
        self.local_points.clear();
    }

    fn init_local(&mut self, bd: &Board<'_>) {
        let is_local = self.is_local.as_mut().unwrap();
        for p in self.local_points.drain(..) {
            is_local[p] = false;
        }
        let to_play = bd.to_play();
        let second = bd.second_color(to_play);
        let mut move_number = bd.nu_moves();
        for _ in 0..3 {
            if move_number == 0 {
                return;
            }
            move_number -= 1;
            let ColorMove { color, mv } = bd.get_move(move_number);
            if color == to_play || color == second || mv.is_null() {
                continue;
            }
            for &p in bd.consts().move_info_ext(mv).attach_points.iter() {
                if !bd.is_forbidden(p, color) && !is_local[p] {
                    is_local[p] = true;
                    self.local_points.push(p);
                }
            }
        }
    }

    fn compute_features(
        &mut self,
        bd: &Board<'_>,
        moves: &[Move],
        check_dist: bool,
        check_connect: bool,
    ) {
        self.init_local(bd);
        let bc = bd.consts();
        let c = bd.to_play();
        let second = bd.second_color(c);
        let is_local = self.is_local.as_ref().unwrap();
        let dist_grid = self.dist_to_center.as_ref().unwrap();

        self.features.clear();
        self.max_heuristic = Float::MIN;
        self.min_dist_to_center = f32::INFINITY;
        self.has_connect_move = false;
        for &mv in moves {
            let info = bc.move_info(mv);
            let ext = bc.move_info_ext(mv);
            let mut heuristic = info.size() as Float;
            for &p in info.points() {
                if is_local[p] {
                    heuristic += 5.0;
                }
            }
            for &p in ext.attach_points.iter() {
                if bd.is_forbidden(p, c) && bd.point_state(p).to_color() != Some(c) {
                    heuristic -= 5.0;
                } else {
                    heuristic += 1.0;
                }
            }
            for &p in ext.adj_points.iter() {
                // Points that turn forbidden on play cost future mobility.
                if !bd.is_forbidden(p, c) {
                    heuristic -= 0.2;
                }
            }
            let connect = check_connect
                && ext
                    .adj_points
                    .iter()
                    .any(|&p| bd.point_state(p).to_color() == Some(second));
            let dist_to_center = if check_dist {
                let d = info
                    .points()
                    .iter()
                    .map(|&p| dist_grid[p])
                    .fold(f32::INFINITY, f32::min);
                self.min_dist_to_center = self.min_dist_to_center.min(d);
                d
            } else {
                f32::INFINITY
            };
            self.has_connect_move |= connect;
            self.max_heuristic = self.max_heuristic.max(heuristic);
            self.features.push(MoveFeatures { heuristic, connect, dist_to_center });
        }
    }

    /// Emits children for all expandable moves with their prior (value,
    /// count) pairs. Returns false if the tree lacks capacity; the caller
    /// then proceeds without expanding.
    pub fn gen_children(
        &mut self,
        bd: &Board<'_>,
        moves: &[Move],
        is_symmetry_broken: bool,
        expander: &mut dyn NodeExpander,
        init_val: Float,
    ) -> bool {
        if !expander.has_capacity(moves.len().max(1)) {
            return false;
        }
        if moves.is_empty() {
            expander.add_child(Move::null(), init_val, 1.0);
            return true;
        }

        let bc = bd.consts();
        let c = bd.to_play();
        let board_type = bc.geometry().board_type();
        let nu_onboard = bd.nu_onboard_pieces();
        let check_dist = check_dist_to_center(board_type, nu_onboard);
        let check_connect = bd.second_color(c) != c && !bd.is_first_piece(c);
        self.compute_features(bd, moves, check_dist, check_connect);

        let mut symmetric_mv = Move::null();
        let mut has_symmetry_breaker = false;
        if !is_symmetry_broken {
            if c.0 & 1 == 1 {
                if let Some(last) = bd.last_move() {
                    if last.color == Color(c.0 ^ 1) && !last.mv.is_null() {
                        symmetric_mv = bc.move_info_ext(last.mv).symmetric_move;
                    }
                }
            } else if bd.nu_moves() > 0 {
                has_symmetry_breaker = moves
                    .iter()
                    .any(|&mv| bc.move_info_ext(mv).breaks_symmetry);
            }
        }

        let mut min_size = min_piece_size(board_type, nu_onboard);
        if !moves.iter().any(|&mv| bc.move_info(mv).size() >= min_size) {
            // The fallback piece set can leave only small pieces; better
            // to expand those than nothing.
            min_size = 0;
        }

        for (i, &mv) in moves.iter().enumerate() {
            let info = bc.move_info(mv);
            if info.size() < min_size {
                continue;
            }
            let features = &self.features[i];
            // Scaled relative to the best move, into (0.1, 1].
            let rel = fast_sigmoid(0.3 * (features.heuristic - self.max_heuristic) as f64);
            let mut value = 0.1 + 0.9 * (1.0 + rel as Float);
            let mut count: Float = 1.0;
            if check_connect && self.has_connect_move && !features.connect {
                value += 3.0 * 0.1;
                count += 3.0;
            }
            if check_dist && self.min_dist_to_center.is_finite() {
                value += if features.dist_to_center == self.min_dist_to_center {
                    3.0 * 1.0
                } else {
                    3.0 * 0.1
                };
                count += 3.0;
            }
            // Encourage exploring the move that keeps or breaks the
            // symmetry race, depending on the side's role.
            if !is_symmetry_broken {
                if c.0 & 1 == 1 {
                    value += if mv == symmetric_mv { 5.0 * 1.0 } else { 5.0 * 0.1 };
                    count += 5.0;
                } else if has_symmetry_breaker {
                    value += if bc.move_info_ext(mv).breaks_symmetry {
                        5.0 * 1.0
                    } else {
                        5.0 * 0.1
                    };
                    count += 5.0;
                }
            }
            value /= count;
            expander.add_child(mv, value, count);
        }
        true
    }
}
