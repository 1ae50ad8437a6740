use crate::blokus::geometry::{Geometry, Grid, Point};
use crate::blokus::piece::{self, Piece, ShapeDef, MAX_PIECE_SIZE};
use crate::blokus::variant::{BoardType, Color, ColorMap, Variant};
use crate::utils::prelude::*;

/// A concrete placement of a piece, as a dense index into the variant's
/// move tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move(u32);

impl Move {
    #[inline]
    pub fn null() -> Move {
        Move(u32::MAX)
    }

    #[inline]
    pub fn from_index(i: usize) -> Move {
        Move(i as u32)
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Cell-level data of a move, inlined for the hot legality loop.
#[derive(Clone, Debug)]
pub struct MoveInfo {
    piece: u8,
    len: u8,
    points: [Point; MAX_PIECE_SIZE],
}

impl MoveInfo {
    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece as Piece
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points[..self.len as usize]
    }
}

/// Precomputed neighbourhood data of a move, used by incremental move
/// generation and the symmetry heuristics.
#[derive(Clone, Debug)]
pub struct MoveInfoExt {
    /// Diagonal-class neighbours of the move that are not orthogonally
    /// adjacent to it: the anchor points this move opens up.
    pub attach_points: Box<[Point]>,
    /// Orthogonal neighbours of the move; they become forbidden to the
    /// color that plays it.
    pub adj_points: Box<[Point]>,
    /// True if the move overlaps its own 180-degree reflection, so playing
    /// it denies the mirror reply.
    pub breaks_symmetry: bool,
    /// The move covering the reflected cell set, if the board has a
    /// reflection map.
    pub symmetric_move: Move,
}

/// A move anchored at some point, with the mask of that point's adj-status
/// list it would cover. Filtering `mask & adj_status == 0` drops moves
/// overlapping already-forbidden neighbours without touching the board.
#[derive(Clone, Copy, Debug)]
pub struct MoveCandidate {
    pub mv: Move,
    pub adj_mask: u8,
}

#[derive(Clone, Debug)]
pub struct PieceInfo {
    pub name: String,
    pub size: u8,
    pub nu_instances: u8,
    /// Attach-point count of an unobstructed placement; feeds the playout
    /// gamma weights.
    pub nu_attach: u8,
}

/// Immutable per-variant constants: the piece set, every legal placement,
/// per-anchor move tables, and the symmetry maps. Built once per process
/// and shared by reference across boards and workers.
#[derive(Clone, Debug)]
pub struct BoardConst {
    variant: Variant,
    geo: Geometry,
    pieces: Vec<PieceInfo>,
    move_infos: Vec<MoveInfo>,
    move_exts: Vec<MoveInfoExt>,
    moves_at: Vec<Box<[MoveCandidate]>>,
    symmetric_points: Option<Grid<Point>>,
    starting_points: ColorMap<Vec<Point>>,
}

impl BoardConst {
    pub fn new(variant: Variant) -> BoardConst {
        let board_type = variant.board_type();
        let geo = Geometry::new(board_type);
        let shapes = match (board_type, variant) {
            (_, Variant::Junior) => piece::junior_shapes(),
            (BoardType::Trigon | BoardType::Trigon3, _) => piece::trigon_shapes(),
            _ => piece::classic_shapes(),
        };
        let nu_instances = if variant == Variant::Junior { 2 } else { 1 };

        let mut bc = BoardConst {
            variant,
            geo,
            pieces: vec![],
            move_infos: vec![],
            move_exts: vec![],
            moves_at: vec![],
            symmetric_points: None,
            starting_points: ColorMap::default(),
        };
        bc.init_symmetric_points();
        bc.init_moves(&shapes, nu_instances);
        bc.init_move_exts();
        bc.init_moves_at();
        bc.init_starting_points();
        bc
    }

    fn init_symmetric_points(&mut self) {
        if !matches!(self.geo.board_type(), BoardType::Duo | BoardType::Trigon) {
            return;
        }
        let mut grid = Grid::new(&self.geo, Point::null());
        for p in self.geo.iter() {
            grid[p] = self.geo.rotated_180(p);
        }
        self.symmetric_points = Some(grid);
    }

    /// Enumerates every distinct placement of every piece by running the
    /// full symmetry group over all anchors and deduplicating on the cell
    /// set. Trigon translations must preserve `x + y` parity.
    fn init_moves(&mut self, shapes: &[ShapeDef], nu_instances: u8) {
        let trigon = self.geo.board_type().is_trigon();
        for (piece, shape) in shapes.iter().enumerate() {
            let orientations = if trigon {
                piece::trigon_orientations(&shape.cells)
            } else {
                piece::square_orientations(&shape.cells)
            };
            let mut placements: BTreeSet<Vec<Point>> = BTreeSet::new();
            for orientation in &orientations {
                for q in self.geo.iter() {
                    let (qx, qy) = self.geo.coord(q);
                    for &(cx, cy) in orientation {
                        let (dx, dy) = (qx - cx, qy - cy);
                        if trigon && (dx + dy) & 1 == 1 {
                            continue;
                        }
                        let mut cells = Vec::with_capacity(orientation.len());
                        for &(x, y) in orientation {
                            match self.geo.find(x + dx, y + dy) {
                                Some(p) => cells.push(p),
                                None => break,
                            }
                        }
                        if cells.len() == orientation.len() {
                            cells.sort();
                            placements.insert(cells);
                        }
                    }
                }
            }
            for cells in placements {
                let mut points = [Point::null(); MAX_PIECE_SIZE];
                points[..cells.len()].copy_from_slice(&cells);
                self.move_infos.push(MoveInfo {
                    piece: piece as u8,
                    len: cells.len() as u8,
                    points,
                });
            }
            self.pieces.push(PieceInfo {
                name: shape.name.clone(),
                size: shape.cells.len() as u8,
                nu_instances,
                nu_attach: 0,
            });
        }
    }

    fn init_move_exts(&mut self) {
        let mut by_cells: HashMap<Vec<Point>, Move> = HashMap::new();
        for (i, info) in self.move_infos.iter().enumerate() {
            by_cells.insert(info.points().to_vec(), Move(i as u32));
        }
        let mut max_attach = vec![0u8; self.pieces.len()];
        for info in &self.move_infos {
            let cells: BTreeSet<Point> = info.points().iter().copied().collect();
            let mut adj: BTreeSet<Point> = BTreeSet::new();
            for &p in info.points() {
                for q in self.geo.adj(p).iter() {
                    if !cells.contains(&q) {
                        adj.insert(q);
                    }
                }
            }
            let mut attach: BTreeSet<Point> = BTreeSet::new();
            for &p in info.points() {
                for q in self.geo.diag(p).iter() {
                    if !cells.contains(&q) && !adj.contains(&q) {
                        attach.insert(q);
                    }
                }
            }
            let (breaks_symmetry, symmetric_move) = match &self.symmetric_points {
                None => (false, Move::null()),
                Some(map) => {
                    let reflected: Vec<Point> = {
                        let mut v: Vec<Point> = info.points().iter().map(|&p| map[p]).collect();
                        v.sort();
                        v
                    };
                    let breaks = reflected.iter().any(|p| cells.contains(p));
                    let symm = by_cells.get(&reflected).copied().unwrap_or_else(Move::null);
                    (breaks, symm)
                }
            };
            max_attach[info.piece()] = max_attach[info.piece()].max(attach.len() as u8);
            self.move_exts.push(MoveInfoExt {
                attach_points: attach.into_iter().collect(),
                adj_points: adj.into_iter().collect(),
                breaks_symmetry,
                symmetric_move,
            });
        }
        for (piece, info) in self.pieces.iter_mut().enumerate() {
            info.nu_attach = max_attach[piece].max(1);
        }
    }

    fn init_moves_at(&mut self) {
        let nu_pieces = self.pieces.len();
        let mut table: Vec<Vec<MoveCandidate>> =
            vec![vec![]; (self.geo.nu_points() + 1) * nu_pieces];
        for (i, info) in self.move_infos.iter().enumerate() {
            let mv = Move(i as u32);
            for &p in info.points() {
                let mut adj_mask = 0u8;
                for (bit, q) in self.geo.adj(p).iter().enumerate() {
                    if info.points().contains(&q) {
                        adj_mask |= 1 << bit;
                    }
                }
                table[p.index() * nu_pieces + info.piece()].push(MoveCandidate { mv, adj_mask });
            }
        }
        self.moves_at = table.into_iter().map(Vec::into_boxed_slice).collect();
    }

    fn init_starting_points(&mut self) {
        let (w, h) = (self.geo.width(), self.geo.height());
        match self.geo.board_type() {
            BoardType::Classic => {
                let corners = [(0, 0), (w - 1, 0), (w - 1, h - 1), (0, h - 1)];
                for (i, (x, y)) in corners.into_iter().enumerate() {
                    self.starting_points[Color(i as u8)].push(self.geo.find(x, y).unwrap());
                }
            }
            BoardType::Duo => {
                self.starting_points[Color(0)].push(self.geo.find(4, 9).unwrap());
                self.starting_points[Color(1)].push(self.geo.find(9, 4).unwrap());
            }
            BoardType::Trigon | BoardType::Trigon3 => {
                // The six hexagon corner cells are shared by all colors.
                let side = h / 2;
                let first = |y: i32| self.geo.find(side - 1 - y.min(h - 1 - y), y).unwrap();
                let last = |y: i32| self.geo.find(w - 1 - (side - 1 - y.min(h - 1 - y)), y).unwrap();
                let corners = [
                    first(0),
                    last(0),
                    self.geo.find(0, side - 1).unwrap(),
                    self.geo.find(w - 1, side).unwrap(),
                    first(h - 1),
                    last(h - 1),
                ];
                for c in Color::all(self.variant.nu_colors()) {
                    self.starting_points[c] = corners.to_vec();
                }
            }
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geo
    }

    pub fn nu_pieces(&self) -> usize {
        self.pieces.len()
    }

    pub fn piece_info(&self, piece: Piece) -> &PieceInfo {
        &self.pieces[piece]
    }

    pub fn nu_moves(&self) -> usize {
        self.move_infos.len()
    }

    #[inline]
    pub fn move_info(&self, mv: Move) -> &MoveInfo {
        debug_assert!(mv.index() < self.move_infos.len());
        unsafe { self.move_infos.get_unchecked(mv.index()) }
    }

    #[inline]
    pub fn move_info_ext(&self, mv: Move) -> &MoveInfoExt {
        debug_assert!(mv.index() < self.move_exts.len());
        unsafe { self.move_exts.get_unchecked(mv.index()) }
    }

    /// Moves of a piece containing `p`, prefiltered against the point's
    /// adj-status bit pattern.
    #[inline]
    pub fn moves(
        &self,
        piece: Piece,
        p: Point,
        adj_status: u8,
    ) -> impl Iterator<Item = Move> + '_ {
        self.moves_at[p.index() * self.pieces.len() + piece]
            .iter()
            .filter(move |cand| cand.adj_mask & adj_status == 0)
            .map(|cand| cand.mv)
    }

    pub fn symmetric_points(&self) -> Option<&Grid<Point>> {
        self.symmetric_points.as_ref()
    }

    pub fn starting_points(&self, c: Color) -> &[Point] {
        &self.starting_points[c]
    }
}
