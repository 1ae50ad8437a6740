use crate::blokus::prelude::*;

const FORBIDDEN: u32 = 1 << 31;
const LOCAL_MASK: u32 = 0xff;
const ADJ_SHIFT: u32 = 8;
const ADJ_UNIT: u32 = 1 << ADJ_SHIFT;
const ADJ_MASK: u32 = 0xff << ADJ_SHIFT;

/// How many trailing history moves feed the locality features; in
/// two-player variants this covers the last two opponent moves.
const NU_LOCAL_MOVES: usize = 3;

/// Per-color grid of packed point features. Each cell carries a forbidden
/// flag, a counter of local attach points at the cell, and a counter of
/// local attach points orthogonally adjacent to it. Summing the cells of
/// a move yields its legality and its full locality feature vector in one
/// pass.
#[derive(Clone, Debug)]
pub struct PlayoutFeatures {
    values: Grid<u32>,
    local_points: Vec<Point>,
}

impl PlayoutFeatures {
    pub fn new(geo: &Geometry) -> PlayoutFeatures {
        PlayoutFeatures { values: Grid::new(geo, 0), local_points: vec![] }
    }

    /// Recomputes the forbidden layer from the board and drops any local
    /// marks. Used to build the per-search snapshot.
    pub fn init_snapshot(&mut self, bd: &Board<'_>, c: Color) {
        self.values.fill(0);
        self.local_points.clear();
        let forbidden = bd.forbidden_grid(c);
        for p in bd.consts().geometry().iter() {
            if forbidden[p] {
                self.values[p] = FORBIDDEN;
            }
        }
    }

    pub fn copy_from(&mut self, other: &PlayoutFeatures) {
        self.values.copy_from(&other.values);
        self.local_points.clone_from(&other.local_points);
    }

    #[inline]
    pub fn set_forbidden(&mut self, p: Point) {
        self.values[p] |= FORBIDDEN;
    }

    #[inline]
    pub fn is_forbidden(&self, p: Point) -> bool {
        self.values[p] & FORBIDDEN != 0
    }

    #[inline]
    pub fn is_local(&self, p: Point) -> bool {
        self.values[p] & LOCAL_MASK != 0
    }

    /// Rebuilds the locality layer from the attach points of the most
    /// recent opponent moves. The previous layer is removed by exact
    /// reversal over the recorded local points.
    pub fn set_local(&mut self, bd: &Board<'_>, to_play: Color) {
        let geo = bd.consts().geometry();
        for i in 0..self.local_points.len() {
            let p = self.local_points[i];
            self.values[p] -= 1;
            for q in geo.adj(p).iter() {
                self.values[q] -= ADJ_UNIT;
            }
        }
        self.local_points.clear();

        let second = bd.second_color(to_play);
        let mut move_number = bd.nu_moves();
        for _ in 0..NU_LOCAL_MOVES {
            if move_number == 0 {
                return;
            }
            move_number -= 1;
            let ColorMove { color, mv } = bd.get_move(move_number);
            if color == to_play || color == second || mv.is_null() {
                continue;
            }
            for &p in bd.consts().move_info_ext(mv).attach_points.iter() {
                if bd.is_forbidden(p, color) || self.values[p] & LOCAL_MASK != 0 {
                    continue;
                }
                self.values[p] += 1;
                self.local_points.push(p);
                for q in geo.adj(p).iter() {
                    self.values[q] += ADJ_UNIT;
                }
            }
        }
    }
}

/// Accumulates the packed features of one candidate move cell by cell.
/// The only branch is the forbidden short-circuit.
#[derive(Clone, Copy, Debug)]
pub struct Compute {
    value: u32,
}

impl Compute {
    #[inline]
    pub fn start(p: Point, f: &PlayoutFeatures) -> Compute {
        Compute { value: f.values[p] }
    }

    #[inline]
    pub fn is_forbidden(&self) -> bool {
        self.value & FORBIDDEN != 0
    }

    /// Adds a cell; returns false if that cell is forbidden.
    #[inline]
    pub fn add(&mut self, p: Point, f: &PlayoutFeatures) -> bool {
        let v = f.values[p];
        if v & FORBIDDEN != 0 {
            return false;
        }
        self.value += v;
        true
    }

    /// Whether the move touches the local area at all.
    #[inline]
    pub fn has_local(&self) -> bool {
        self.value != 0
    }

    /// Number of local attach points the move covers.
    #[inline]
    pub fn nu_attach(&self) -> u32 {
        self.value & LOCAL_MASK
    }

    /// Whether the move has a cell orthogonally adjacent to a local
    /// attach point.
    #[inline]
    pub fn has_adj_attach(&self) -> bool {
        self.value & ADJ_MASK != 0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(nu_attach: u32, nu_adj: u32) -> Compute {
        Compute { value: nu_attach + (nu_adj << ADJ_SHIFT) }
    }
}
