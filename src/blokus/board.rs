use crate::blokus::board_const::{BoardConst, Move};
use crate::blokus::geometry::{Grid, Point};
use crate::blokus::piece::{Piece, PieceMask};
use crate::blokus::variant::{Color, ColorMap, Variant, MAX_COLORS};
use crate::utils::prelude::*;

/// Contents of a single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointState(u8);

impl PointState {
    const EMPTY: u8 = u8::MAX;

    pub fn empty() -> PointState {
        PointState(PointState::EMPTY)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == PointState::EMPTY
    }

    #[inline]
    pub fn to_color(self) -> Option<Color> {
        (!self.is_empty()).then_some(Color(self.0))
    }
}

impl From<Color> for PointState {
    fn from(c: Color) -> PointState {
        PointState(c.0)
    }
}

/// A move tagged with the color that plays it; a null move is a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorMove {
    pub color: Color,
    pub mv: Move,
}

/// The mutable part of a board, kept separate so snapshots and restores
/// are plain buffer copies with no allocation.
#[derive(Clone, Debug)]
struct BoardState {
    point_state: Grid<PointState>,
    forbidden: [Grid<bool>; MAX_COLORS],
    attach_marker: [Grid<bool>; MAX_COLORS],
    attach_points: ColorMap<Vec<Point>>,
    pieces_left: ColorMap<Vec<u8>>,
    left_mask: ColorMap<PieceMask>,
    nu_onboard: ColorMap<u32>,
    points: ColorMap<u32>,
    bonus: ColorMap<i32>,
    history: Vec<ColorMove>,
    to_play: Color,
    nu_onboard_total: u32,
}

impl BoardState {
    fn new(consts: &BoardConst) -> BoardState {
        let geo = consts.geometry();
        let mut state = BoardState {
            point_state: Grid::new(geo, PointState::empty()),
            forbidden: std::array::from_fn(|_| Grid::new(geo, false)),
            attach_marker: std::array::from_fn(|_| Grid::new(geo, false)),
            attach_points: ColorMap::default(),
            pieces_left: ColorMap::default(),
            left_mask: ColorMap::default(),
            nu_onboard: ColorMap::default(),
            points: ColorMap::default(),
            bonus: ColorMap::default(),
            history: vec![],
            to_play: Color(0),
            nu_onboard_total: 0,
        };
        for c in Color::all(consts.variant().nu_colors()) {
            state.pieces_left[c] = (0..consts.nu_pieces())
                .map(|p| consts.piece_info(p).nu_instances)
                .collect();
            state.left_mask[c] = PieceMask::all(consts.nu_pieces());
        }
        state
    }

    fn copy_from(&mut self, other: &BoardState) {
        self.point_state.copy_from(&other.point_state);
        for i in 0..MAX_COLORS {
            self.forbidden[i].copy_from(&other.forbidden[i]);
            self.attach_marker[i].copy_from(&other.attach_marker[i]);
            let c = Color(i as u8);
            self.attach_points[c].clone_from(&other.attach_points[c]);
            self.pieces_left[c].clone_from(&other.pieces_left[c]);
            self.left_mask[c] = other.left_mask[c];
            self.nu_onboard[c] = other.nu_onboard[c];
            self.points[c] = other.points[c];
            self.bonus[c] = other.bonus[c];
        }
        self.history.clone_from(&other.history);
        self.to_play = other.to_play;
        self.nu_onboard_total = other.nu_onboard_total;
    }
}

/// A playable board for one variant. All rule bookkeeping (forbidden
/// cells, attach points, piece bags, score) is updated incrementally per
/// play; there is no undo, only snapshot/restore.
#[derive(Clone, Debug)]
pub struct Board<'c> {
    consts: &'c BoardConst,
    state: BoardState,
    snapshot: Option<Box<BoardState>>,
}

impl<'c> Board<'c> {
    pub fn new(consts: &'c BoardConst) -> Board<'c> {
        Board { consts, state: BoardState::new(consts), snapshot: None }
    }

    pub fn consts(&self) -> &'c BoardConst {
        self.consts
    }

    pub fn variant(&self) -> Variant {
        self.consts.variant()
    }

    pub fn nu_colors(&self) -> usize {
        self.variant().nu_colors()
    }

    pub fn to_play(&self) -> Color {
        self.state.to_play
    }

    pub fn set_to_play(&mut self, c: Color) {
        self.state.to_play = c;
    }

    pub fn next_color(&self, c: Color) -> Color {
        Color((c.0 + 1) % self.nu_colors() as u8)
    }

    pub fn second_color(&self, c: Color) -> Color {
        self.variant().second_color(c)
    }

    #[inline]
    pub fn point_state(&self, p: Point) -> PointState {
        self.state.point_state[p]
    }

    #[inline]
    pub fn is_forbidden(&self, p: Point, c: Color) -> bool {
        self.state.forbidden[c.index()][p]
    }

    pub fn forbidden_grid(&self, c: Color) -> &Grid<bool> {
        &self.state.forbidden[c.index()]
    }

    /// Bit pattern of forbidden orthogonal neighbours, in the geometry's
    /// neighbour order; indexes the precomputed move candidate masks.
    #[inline]
    pub fn adj_status(&self, p: Point, c: Color) -> u8 {
        let forbidden = &self.state.forbidden[c.index()];
        let mut status = 0u8;
        for (bit, q) in self.consts.geometry().adj(p).iter().enumerate() {
            status |= (forbidden[q] as u8) << bit;
        }
        status
    }

    pub fn is_attach_point(&self, p: Point, c: Color) -> bool {
        self.state.attach_marker[c.index()][p]
    }

    /// Attach candidates for a color. The list may retain points that
    /// became forbidden later; callers filter with `is_forbidden`.
    pub fn attach_points(&self, c: Color) -> &[Point] {
        &self.state.attach_points[c]
    }

    pub fn pieces_left(&self, c: Color) -> PieceMask {
        self.state.left_mask[c]
    }

    #[inline]
    pub fn is_piece_left(&self, c: Color, piece: Piece) -> bool {
        self.state.left_mask[c].contains(piece)
    }

    pub fn is_first_piece(&self, c: Color) -> bool {
        self.state.nu_onboard[c] == 0
    }

    pub fn starting_points(&self, c: Color) -> &[Point] {
        self.consts.starting_points(c)
    }

    pub fn nu_moves(&self) -> usize {
        self.state.history.len()
    }

    pub fn get_move(&self, i: usize) -> ColorMove {
        self.state.history[i]
    }

    pub fn last_move(&self) -> Option<ColorMove> {
        self.state.history.last().copied()
    }

    pub fn nu_onboard_pieces(&self) -> u32 {
        self.state.nu_onboard_total
    }

    pub fn nu_onboard_pieces_color(&self, c: Color) -> u32 {
        self.state.nu_onboard[c]
    }

    pub fn points(&self, c: Color) -> u32 {
        self.state.points[c]
    }

    /// Colors that take part in the score ranking; Classic-3's fourth
    /// color is played in rotation and excluded.
    pub fn nu_scored_colors(&self) -> usize {
        match self.variant() {
            Variant::Classic3 => 3,
            v => v.nu_colors(),
        }
    }

    fn side_total(&self, c: Color) -> i32 {
        (self.state.points[c] as i32) + self.state.bonus[c]
    }

    /// Signed score of a color: pooled difference in two-player variants,
    /// own total minus the mean opponent total in multiplayer ones.
    pub fn score(&self, c: Color) -> i32 {
        let variant = self.variant();
        match variant {
            Variant::Duo | Variant::Junior => self.side_total(c) - self.side_total(Color(c.0 ^ 1)),
            Variant::Classic2 | Variant::Trigon2 => {
                let second = variant.second_color(c);
                let (opp, opp2) = (Color(c.0 ^ 1), Color(second.0 ^ 1));
                self.side_total(c) + self.side_total(second)
                    - self.side_total(opp)
                    - self.side_total(opp2)
            }
            _ => {
                let real = self.nu_scored_colors();
                let mut others = 0;
                let mut nu_others = 0;
                for cc in Color::all(real) {
                    if cc != c {
                        others += self.side_total(cc);
                        nu_others += 1;
                    }
                }
                self.side_total(c) - others / nu_others.max(1)
            }
        }
    }

    /// Whether a move is legal for a color in the current position. The
    /// engine path never calls this; it is the contract check for the
    /// checked `play` and for tests.
    pub fn is_legal(&self, c: Color, mv: Move) -> bool {
        let info = self.consts.move_info(mv);
        if !self.is_piece_left(c, info.piece()) {
            return false;
        }
        if info.points().iter().any(|&p| self.is_forbidden(p, c)) {
            return false;
        }
        if self.is_first_piece(c) {
            info.points()
                .iter()
                .any(|&p| self.starting_points(c).contains(&p))
        } else {
            info.points().iter().any(|&p| self.is_attach_point(p, c))
        }
    }

    /// Plays a move after validating it.
    pub fn play(&mut self, c: Color, mv: Move) -> Result<()> {
        if mv.is_null() {
            self.play_pass(c);
            return Ok(());
        }
        if !self.is_legal(c, mv) {
            return Err(anyhow!("move {} is not legal for color {}", mv.index(), c.0));
        }
        self.play_unchecked(c, mv);
        Ok(())
    }

    /// Plays a piece with no checks; engine use only.
    pub fn play_unchecked(&mut self, c: Color, mv: Move) {
        debug_assert!(self.is_legal(c, mv));
        let info = self.consts.move_info(mv);
        let ext = self.consts.move_info_ext(mv);
        let piece = info.piece();

        for &p in info.points() {
            self.state.point_state[p] = PointState::from(c);
        }
        for cc in 0..self.nu_colors() {
            let forbidden = &mut self.state.forbidden[cc];
            for &p in info.points() {
                forbidden[p] = true;
            }
        }
        {
            let forbidden = &mut self.state.forbidden[c.index()];
            for &p in ext.adj_points.iter() {
                forbidden[p] = true;
            }
        }
        {
            let marker = &mut self.state.attach_marker[c.index()];
            for &p in ext.attach_points.iter() {
                if !marker[p] {
                    marker[p] = true;
                    self.state.attach_points[c].push(p);
                }
            }
        }

        let left = &mut self.state.pieces_left[c][piece];
        debug_assert!(*left > 0);
        *left -= 1;
        if *left == 0 {
            self.state.left_mask[c].clear(piece);
        }
        self.state.points[c] += info.size() as u32;
        self.state.nu_onboard[c] += 1;
        self.state.nu_onboard_total += 1;
        if self.state.left_mask[c].is_empty() {
            // Standard scoring: +15 for placing everything, +20 if the
            // monomino went down last.
            self.state.bonus[c] = if info.size() == 1 { 20 } else { 15 };
        }

        self.state.history.push(ColorMove { color: c, mv });
        self.state.to_play = self.next_color(c);
    }

    pub fn play_pass(&mut self, c: Color) {
        self.state.history.push(ColorMove { color: c, mv: Move::null() });
        self.state.to_play = self.next_color(c);
    }

    /// Copies another board's position; both must share the same constants.
    pub fn copy_from(&mut self, other: &Board<'c>) {
        debug_assert!(std::ptr::eq(self.consts, other.consts));
        self.state.copy_from(&other.state);
    }

    pub fn take_snapshot(&mut self) {
        match &mut self.snapshot {
            Some(snap) => snap.copy_from(&self.state),
            None => self.snapshot = Some(Box::new(self.state.clone())),
        }
    }

    pub fn restore_snapshot(&mut self) {
        let snap = self.snapshot.take().expect("no snapshot taken");
        self.state.copy_from(&snap);
        self.snapshot = Some(snap);
    }
}

impl std::fmt::Display for Board<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let geo = self.consts.geometry();
        const CHARS: [char; 4] = ['B', 'Y', 'R', 'G'];
        for y in 0..geo.height() {
            for x in 0..geo.width() {
                let ch = match geo.find(x, y) {
                    None => ' ',
                    Some(p) => match self.point_state(p).to_color() {
                        None => '.',
                        Some(c) => CHARS[c.index()],
                    },
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_starting_move(bd: &Board<'_>, c: Color, piece: Piece) -> Move {
        let sp = bd.starting_points(c)[0];
        bd.consts()
            .moves(piece, sp, 0)
            .find(|&mv| bd.is_legal(c, mv))
            .unwrap()
    }

    #[test]
    fn play_updates_forbidden_and_attach() {
        let bc = BoardConst::new(Variant::Duo);
        let mut bd = Board::new(&bc);
        let mv = first_starting_move(&bd, Color(0), 4); // I4
        bd.play(Color(0), mv).unwrap();

        let info = bc.move_info(mv);
        let ext = bc.move_info_ext(mv);
        for &p in info.points() {
            assert!(bd.is_forbidden(p, Color(0)));
            assert!(bd.is_forbidden(p, Color(1)));
            assert_eq!(bd.point_state(p).to_color(), Some(Color(0)));
        }
        for &p in ext.adj_points.iter() {
            assert!(bd.is_forbidden(p, Color(0)));
            assert!(!bd.is_forbidden(p, Color(1)));
        }
        for &p in ext.attach_points.iter() {
            assert!(bd.is_attach_point(p, Color(0)));
        }
        assert!(!bd.is_piece_left(Color(0), 4));
        assert!(!bd.is_first_piece(Color(0)));
        assert_eq!(bd.to_play(), Color(1));
        assert_eq!(bd.points(Color(0)), 4);
        assert_eq!(bd.score(Color(0)), 4);
        assert_eq!(bd.score(Color(1)), -4);
    }

    #[test]
    fn junior_has_two_instances() {
        let bc = BoardConst::new(Variant::Junior);
        let mut bd = Board::new(&bc);
        let mv = first_starting_move(&bd, Color(0), 0);
        bd.play(Color(0), mv).unwrap();
        assert!(bd.is_piece_left(Color(0), 0));
    }

    #[test]
    fn snapshot_roundtrip_restores_everything() {
        let bc = BoardConst::new(Variant::Duo);
        let mut bd = Board::new(&bc);
        let mv = first_starting_move(&bd, Color(0), 10); // I5
        bd.play(Color(0), mv).unwrap();
        bd.take_snapshot();

        let before_points = bd.points(Color(0));
        let mv1 = first_starting_move(&bd, Color(1), 10);
        bd.play(Color(1), mv1).unwrap();
        let next = bd
            .attach_points(Color(0))
            .iter()
            .copied()
            .find(|&p| !bd.is_forbidden(p, Color(0)))
            .unwrap();
        let status = bd.adj_status(next, Color(0));
        let mv2 = bc
            .moves(0, next, status)
            .find(|&m| bd.is_legal(Color(0), m))
            .unwrap();
        bd.play(Color(0), mv2).unwrap();

        bd.restore_snapshot();
        assert_eq!(bd.nu_moves(), 1);
        assert_eq!(bd.points(Color(0)), before_points);
        assert_eq!(bd.points(Color(1)), 0);
        assert!(bd.is_piece_left(Color(1), 10));
        assert_eq!(bd.to_play(), Color(1));
        for p in bc.geometry().iter() {
            if !bc.move_info(mv).points().contains(&p) {
                assert!(bd.point_state(p).is_empty());
            }
        }
    }

    #[test]
    fn passes_rotate_to_play_without_board_change() {
        let bc = BoardConst::new(Variant::Classic);
        let mut bd = Board::new(&bc);
        bd.play_pass(Color(0));
        assert_eq!(bd.to_play(), Color(1));
        assert_eq!(bd.nu_moves(), 1);
        assert_eq!(bd.nu_onboard_pieces(), 0);
        assert!(bd.get_move(0).mv.is_null());
    }

    #[test]
    fn multiplayer_score_is_mean_relative() {
        let bc = BoardConst::new(Variant::Classic);
        let mut bd = Board::new(&bc);
        for c in Color::all(4) {
            let mv = first_starting_move(&bd, c, 10); // I5 in every corner
            bd.play(c, mv).unwrap();
        }
        for c in Color::all(4) {
            assert_eq!(bd.score(c), 0);
        }
    }
}
