use crate::blokus::prelude::*;
use crate::mcts::gamma::Gamma;
use crate::mcts::move_marker::MoveMarker;
use crate::mcts::playout_features::{Compute, PlayoutFeatures};

/// Per-color legal move lists with parallel cumulative gamma weights,
/// maintained incrementally across a playout.
///
/// The incremental contract: a listed move stays legal until one of its
/// cells turns forbidden, and new legal moves can only appear anchored at
/// attach points opened by the color's own plays (plus pieces that enter
/// the considered set as the game grows). `init` establishes the contract
/// from scratch; `update` maintains it after own plays.
#[derive(Clone, Debug, Default)]
pub struct MoveLists {
    moves: ColorMap<Vec<Move>>,
    cumulative_gamma: ColorMap<Vec<f64>>,
    marker: ColorMap<MoveMarker>,
    moves_added_at: ColorMap<Option<Grid<bool>>>,
    added_points: ColorMap<Vec<Point>>,
    is_initialized: ColorMap<bool>,
    last_considered: ColorMap<PieceMask>,
}

impl MoveLists {
    pub fn new(bc: &BoardConst) -> MoveLists {
        let mut lists = MoveLists::default();
        for c in Color::all(bc.variant().nu_colors()) {
            lists.marker[c] = MoveMarker::new(bc.nu_moves());
            lists.moves_added_at[c] = Some(Grid::new(bc.geometry(), false));
        }
        lists
    }

    #[inline]
    pub fn moves(&self, c: Color) -> &[Move] {
        &self.moves[c]
    }

    #[inline]
    pub fn cumulative_gamma(&self, c: Color) -> &[f64] {
        &self.cumulative_gamma[c]
    }

    /// Total gamma weight of a color's list; zero when empty.
    #[inline]
    pub fn total_gamma(&self, c: Color) -> f64 {
        self.cumulative_gamma[c].last().copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn is_initialized(&self, c: Color) -> bool {
        self.is_initialized[c]
    }

    /// Forgets all per-simulation state; lists rebuild lazily on demand.
    pub fn start_simulation(&mut self) {
        for init in self.is_initialized.iter_mut() {
            *init = false;
        }
    }

    /// Builds a color's move list from scratch, as on the color's first
    /// request in a simulation. Locality features must already be set
    /// for `c`.
    pub fn init(
        &mut self,
        bd: &Board<'_>,
        features: &PlayoutFeatures,
        gamma: &Gamma,
        c: Color,
        considered: PieceMask,
    ) {
        let bc = bd.consts();
        self.moves[c].clear();
        self.cumulative_gamma[c].clear();
        let added = self.moves_added_at[c].as_mut().unwrap();
        for p in self.added_points[c].drain(..) {
            added[p] = false;
        }

        let pieces = considered.intersect(bd.pieces_left(c));
        let mut total = 0.0;
        if bd.is_first_piece(c) {
            // A single starting point is mandatory: the incremental update
            // assumes a listed move stays legal while its cells stay
            // unforbidden, which breaks if alternative starting points can
            // be blocked from under retained moves.
            if let Some(sp) = find_best_starting_point(bd, c) {
                for piece in pieces.iter() {
                    for mv in bc.moves(piece, sp, 0) {
                        self.try_add(bd, features, gamma, c, mv, &mut total);
                    }
                }
            }
        } else {
            for i in 0..bd.attach_points(c).len() {
                let p = bd.attach_points(c)[i];
                if bd.is_forbidden(p, c) {
                    continue;
                }
                self.moves_added_at[c].as_mut().unwrap()[p] = true;
                self.added_points[c].push(p);
                let adj_status = bd.adj_status(p, c);
                for piece in pieces.iter() {
                    for mv in bc.moves(piece, p, adj_status) {
                        self.try_add(bd, features, gamma, c, mv, &mut total);
                    }
                }
            }
        }

        let moves = std::mem::take(&mut self.moves[c]);
        self.marker[c].clear_list(&moves);
        self.moves[c] = moves;
        self.is_initialized[c] = true;
        self.last_considered[c] = considered;
    }

    /// Refreshes a color's list after its own plays: filters stale moves,
    /// extends from the new pieces' attach points, and enumerates pieces
    /// that newly entered the considered set.
    pub fn update(
        &mut self,
        bd: &Board<'_>,
        features: &PlayoutFeatures,
        gamma: &Gamma,
        c: Color,
        new_moves: &mut Vec<Move>,
        considered: PieceMask,
    ) {
        let bc = bd.consts();

        // When every piece exists once and exactly one was just played,
        // the piece id alone identifies the moves that lost their piece.
        let single_used: Option<Piece> =
            match bd.variant().one_instance_per_piece() && new_moves.len() == 1 {
                true => Some(bc.move_info(new_moves[0]).piece()),
                false => None,
            };

        let mut moves = std::mem::take(&mut self.moves[c]);
        let mut cg = std::mem::take(&mut self.cumulative_gamma[c]);
        let mut total = 0.0;
        let mut kept = 0;
        for i in 0..moves.len() {
            let mv = moves[i];
            let info = bc.move_info(mv);
            let piece = info.piece();
            match single_used {
                Some(used) if piece == used => continue,
                None if !bd.is_piece_left(c, piece) => continue,
                _ => {}
            }
            let mut compute = Compute::start(info.points()[0], features);
            if compute.is_forbidden() {
                continue;
            }
            if !info.points()[1..].iter().all(|&p| compute.add(p, features)) {
                continue;
            }
            total += gamma.of(piece, &compute);
            moves[kept] = mv;
            cg[kept] = total;
            self.marker[c].set(mv);
            kept += 1;
        }
        moves.truncate(kept);
        cg.truncate(kept);
        self.moves[c] = moves;
        self.cumulative_gamma[c] = cg;

        for mv in new_moves.drain(..) {
            let ext = bc.move_info_ext(mv);
            for &p in ext.attach_points.iter() {
                if bd.is_forbidden(p, c) || self.moves_added_at[c].as_ref().unwrap()[p] {
                    continue;
                }
                self.moves_added_at[c].as_mut().unwrap()[p] = true;
                self.added_points[c].push(p);
                self.add_moves_at(bd, features, gamma, c, p, considered, &mut total);
            }
        }

        let newly = considered.minus(self.last_considered[c]);
        if !newly.is_empty() {
            for i in 0..bd.attach_points(c).len() {
                let p = bd.attach_points(c)[i];
                if !bd.is_forbidden(p, c) {
                    self.add_moves_at(bd, features, gamma, c, p, newly, &mut total);
                }
            }
        }

        let moves = std::mem::take(&mut self.moves[c]);
        self.marker[c].clear_list(&moves);
        self.moves[c] = moves;
        self.last_considered[c] = considered;
    }

    fn add_moves_at(
        &mut self,
        bd: &Board<'_>,
        features: &PlayoutFeatures,
        gamma: &Gamma,
        c: Color,
        p: Point,
        considered: PieceMask,
        total: &mut f64,
    ) {
        let adj_status = bd.adj_status(p, c);
        for piece in considered.intersect(bd.pieces_left(c)).iter() {
            for mv in bd.consts().moves(piece, p, adj_status) {
                self.try_add(bd, features, gamma, c, mv, total);
            }
        }
    }

    #[inline]
    fn try_add(
        &mut self,
        bd: &Board<'_>,
        features: &PlayoutFeatures,
        gamma: &Gamma,
        c: Color,
        mv: Move,
        total: &mut f64,
    ) {
        if self.marker[c].contains(mv) {
            return;
        }
        let info = bd.consts().move_info(mv);
        let mut compute = Compute::start(info.points()[0], features);
        if compute.is_forbidden() {
            return;
        }
        if !info.points()[1..].iter().all(|&p| compute.add(p, features)) {
            return;
        }
        *total += gamma.of(info.piece(), &compute);
        self.marker[c].set(mv);
        self.moves[c].push(mv);
        self.cumulative_gamma[c].push(*total);
    }
}

/// Picks the single starting point for a color's first piece: the free,
/// unforbidden starting point farthest (weighted) from all occupied
/// starting points, counting the own side double. Ties keep the first
/// point in enumeration order.
pub fn find_best_starting_point(bd: &Board<'_>, c: Color) -> Option<Point> {
    let geo = bd.consts().geometry();
    let second = bd.second_color(c);
    let mut best = None;
    let mut max_distance = -1.0f32;
    for &p in bd.starting_points(c) {
        if bd.is_forbidden(p, c) {
            continue;
        }
        let mut d = 0.0f32;
        for cc in Color::all(bd.nu_colors()) {
            for &pp in bd.starting_points(cc) {
                let s = bd.point_state(pp);
                let Some(occupier) = s.to_color() else { continue };
                let weight = if occupier == c || occupier == second { 2.0 } else { 1.0 };
                d += weight * geo.distance(p, pp);
            }
        }
        if d > max_distance {
            best = Some(p);
            max_distance = d;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::prelude::*;

    fn init_for(
        bd: &Board<'_>,
        lists: &mut MoveLists,
        features: &mut PlayoutFeatures,
        gamma: &Gamma,
        c: Color,
    ) {
        features.init_snapshot(bd, c);
        features.set_local(bd, c);
        lists.init(bd, features, gamma, c, PieceMask::all(bd.consts().nu_pieces()));
    }

    #[test]
    fn empty_board_list_uses_one_starting_point() {
        let bc = BoardConst::new(Variant::Duo);
        let bd = Board::new(&bc);
        let gamma = Gamma::new(&bc);
        let mut lists = MoveLists::new(&bc);
        let mut features = PlayoutFeatures::new(bc.geometry());
        init_for(&bd, &mut lists, &mut features, &gamma, Color(0));

        let moves = lists.moves(Color(0));
        assert!(!moves.is_empty());
        let sp = find_best_starting_point(&bd, Color(0)).unwrap();
        assert_eq!(sp, bd.starting_points(Color(0))[0]);
        for &mv in moves {
            assert!(bc.move_info(mv).points().contains(&sp));
        }
        // Cumulative gamma is strictly increasing and positive.
        let cg = lists.cumulative_gamma(Color(0));
        assert_eq!(cg.len(), moves.len());
        assert!(cg.windows(2).all(|w| w[0] < w[1]));
        assert!(lists.total_gamma(Color(0)) > 0.0);
    }

    #[test]
    fn shared_starting_points_spread_out() {
        let bc = BoardConst::new(Variant::Trigon);
        let mut bd = Board::new(&bc);
        let sp0 = find_best_starting_point(&bd, Color(0)).unwrap();
        let mv = bc.moves(0, sp0, 0).next().unwrap();
        bd.play(Color(0), mv).unwrap();

        // The next color must avoid the occupied corner and prefer one at
        // maximum weighted distance from it.
        let sp1 = find_best_starting_point(&bd, Color(1)).unwrap();
        assert_ne!(sp1, sp0);
        let geo = bc.geometry();
        let best: f32 = bd
            .starting_points(Color(1))
            .iter()
            .filter(|&&p| !bd.is_forbidden(p, Color(1)))
            .map(|&p| geo.distance(p, sp0))
            .fold(0.0, f32::max);
        assert!((geo.distance(sp1, sp0) - best).abs() < 1e-3);
    }

    #[test]
    fn no_duplicates_and_all_legal() {
        let bc = BoardConst::new(Variant::Duo);
        let mut bd = Board::new(&bc);
        let gamma = Gamma::new(&bc);
        for c in [Color(0), Color(1)] {
            let sp = bd.starting_points(c)[0];
            let mv = bc.moves(17, sp, 0).find(|&m| bd.is_legal(c, m)).unwrap(); // W
            bd.play(c, mv).unwrap();
        }
        let mut lists = MoveLists::new(&bc);
        let mut features = PlayoutFeatures::new(bc.geometry());
        init_for(&bd, &mut lists, &mut features, &gamma, Color(0));

        let moves = lists.moves(Color(0));
        assert!(!moves.is_empty());
        let unique: HashSet<_> = moves.iter().collect();
        assert_eq!(unique.len(), moves.len());
        for &mv in moves {
            assert!(bd.is_legal(Color(0), mv));
        }
    }

    #[test]
    fn update_matches_fresh_init() {
        let bc = BoardConst::new(Variant::Duo);
        let mut bd = Board::new(&bc);
        let gamma = Gamma::new(&bc);
        let mut lists = MoveLists::new(&bc);
        let mut features = PlayoutFeatures::new(bc.geometry());
        let all = PieceMask::all(bc.nu_pieces());

        // Color 0 builds its list, plays from it, and updates.
        init_for(&bd, &mut lists, &mut features, &gamma, Color(0));
        let mv0 = lists.moves(Color(0))[0];
        bd.play(Color(0), mv0).unwrap();
        // Opponent reply.
        let sp1 = bd.starting_points(Color(1))[0];
        let mv1 = bc.moves(20, sp1, 0).find(|&m| bd.is_legal(Color(1), m)).unwrap();
        bd.play(Color(1), mv1).unwrap();

        features.init_snapshot(&bd, Color(0));
        features.set_local(&bd, Color(0));
        let mut new_moves = vec![mv0];
        lists.update(&bd, &features, &gamma, Color(0), &mut new_moves, all);

        let mut incremental: Vec<Move> = lists.moves(Color(0)).to_vec();
        incremental.sort();

        let mut fresh_lists = MoveLists::new(&bc);
        let mut fresh_features = PlayoutFeatures::new(bc.geometry());
        init_for(&bd, &mut fresh_lists, &mut fresh_features, &gamma, Color(0));
        let mut full: Vec<Move> = fresh_lists.moves(Color(0)).to_vec();
        full.sort();

        assert_eq!(incremental, full);
        let diff = (lists.total_gamma(Color(0)) - fresh_lists.total_gamma(Color(0))).abs();
        assert!(diff <= 1e-9 * fresh_lists.total_gamma(Color(0)).max(1.0));
    }
}
