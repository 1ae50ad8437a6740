use crate::utils::prelude::*;

/// Stable index of a piece shape inside a variant's piece set.
pub type Piece = usize;

/// Largest cell count of any piece (hexiamonds on trigon boards).
pub const MAX_PIECE_SIZE: usize = 6;

/// A bitmask over a variant's piece set; every set fits in 32 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PieceMask(u32);

impl PieceMask {
    pub fn empty() -> PieceMask {
        PieceMask(0)
    }

    pub fn all(nu_pieces: usize) -> PieceMask {
        PieceMask(if nu_pieces >= 32 { u32::MAX } else { (1 << nu_pieces) - 1 })
    }

    #[inline]
    pub fn contains(self, piece: Piece) -> bool {
        self.0 >> piece & 1 == 1
    }

    pub fn set(&mut self, piece: Piece) {
        self.0 |= 1 << piece;
    }

    pub fn clear(&mut self, piece: Piece) {
        self.0 &= !(1 << piece);
    }

    #[inline]
    pub fn intersect(self, other: PieceMask) -> PieceMask {
        PieceMask(self.0 & other.0)
    }

    /// Pieces in `self` that are not in `other`.
    #[inline]
    pub fn minus(self, other: PieceMask) -> PieceMask {
        PieceMask(self.0 & !other.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Piece> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let i = bits.trailing_zeros() as Piece;
            bits &= bits - 1;
            Some(i)
        })
    }
}

/// A piece shape in grid cells, before placement enumeration. Square cells
/// live on the plain integer lattice; trigon cells alternate triangle
/// orientation by `(x + y) & 1`.
#[derive(Clone, Debug)]
pub struct ShapeDef {
    pub name: String,
    pub cells: Vec<(i32, i32)>,
}

impl ShapeDef {
    fn new(name: &str, cells: &[(i32, i32)]) -> ShapeDef {
        ShapeDef { name: name.into(), cells: cells.to_vec() }
    }
}

/// The 21 standard polyominoes of sizes 1 to 5 with their usual names.
pub fn classic_shapes() -> Vec<ShapeDef> {
    vec![
        ShapeDef::new("1", &[(0, 0)]),
        ShapeDef::new("2", &[(0, 0), (1, 0)]),
        ShapeDef::new("I3", &[(0, 0), (1, 0), (2, 0)]),
        ShapeDef::new("V3", &[(0, 0), (1, 0), (0, 1)]),
        ShapeDef::new("I4", &[(0, 0), (1, 0), (2, 0), (3, 0)]),
        ShapeDef::new("L4", &[(0, 0), (1, 0), (2, 0), (0, 1)]),
        ShapeDef::new("T4", &[(0, 0), (1, 0), (2, 0), (1, 1)]),
        ShapeDef::new("O4", &[(0, 0), (1, 0), (0, 1), (1, 1)]),
        ShapeDef::new("Z4", &[(1, 0), (2, 0), (0, 1), (1, 1)]),
        ShapeDef::new("F", &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)]),
        ShapeDef::new("I5", &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]),
        ShapeDef::new("L5", &[(0, 0), (1, 0), (2, 0), (3, 0), (0, 1)]),
        ShapeDef::new("N", &[(0, 0), (1, 0), (1, 1), (2, 1), (3, 1)]),
        ShapeDef::new("P", &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]),
        ShapeDef::new("T5", &[(0, 0), (1, 0), (2, 0), (1, 1), (1, 2)]),
        ShapeDef::new("U", &[(0, 0), (2, 0), (0, 1), (1, 1), (2, 1)]),
        ShapeDef::new("V5", &[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]),
        ShapeDef::new("W", &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)]),
        ShapeDef::new("X", &[(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)]),
        ShapeDef::new("Y", &[(1, 0), (0, 1), (1, 1), (1, 2), (1, 3)]),
        ShapeDef::new("Z5", &[(0, 0), (1, 0), (1, 1), (1, 2), (2, 2)]),
    ]
}

/// The Junior subset: 12 shapes, each owned twice per color.
pub fn junior_shapes() -> Vec<ShapeDef> {
    let wanted = ["1", "2", "I3", "V3", "I4", "L4", "O4", "Z4", "T4", "I5", "L5", "P"];
    classic_shapes()
        .into_iter()
        .filter(|s| wanted.contains(&s.name.as_str()))
        .collect()
}

/// All free polyiamonds up to hexiamonds, generated by canonical-form
/// growth. Yields exactly 1/1/1/3/4/12 shapes by size, 22 in total.
pub fn trigon_shapes() -> Vec<ShapeDef> {
    let mut shapes = vec![];
    let mut level: BTreeSet<Vec<(i32, i32)>> = BTreeSet::new();
    level.insert(canonical_trigon(&[(0, 0)]));
    for size in 1..=MAX_PIECE_SIZE {
        for (i, cells) in level.iter().enumerate() {
            shapes.push(ShapeDef {
                name: format!("T{}{}", size, (b'a' + i as u8) as char),
                cells: cells.clone(),
            });
        }
        if size == MAX_PIECE_SIZE {
            break;
        }
        let mut next = BTreeSet::new();
        for cells in &level {
            for &(x, y) in cells {
                for (nx, ny) in trigon_cell_neighbours(x, y) {
                    if cells.contains(&(nx, ny)) {
                        continue;
                    }
                    let mut grown = cells.clone();
                    grown.push((nx, ny));
                    next.insert(canonical_trigon(&grown));
                }
            }
        }
        level = next;
    }
    shapes
}

fn trigon_cell_neighbours(x: i32, y: i32) -> [(i32, i32); 3] {
    if (x + y) & 1 == 0 {
        [(x - 1, y), (x + 1, y), (x, y + 1)]
    } else {
        [(x - 1, y), (x + 1, y), (x, y - 1)]
    }
}

/// The 8 square-lattice symmetries of a cell set.
pub fn square_orientations(cells: &[(i32, i32)]) -> Vec<Vec<(i32, i32)>> {
    let mut out = Vec::with_capacity(8);
    let mut current = cells.to_vec();
    for _ in 0..4 {
        out.push(current.clone());
        out.push(current.iter().map(|&(x, y)| (-x, y)).collect());
        current = current.iter().map(|&(x, y)| (y, -x)).collect();
    }
    out
}

/// The 12 triangle-lattice symmetries of a cell set.
///
/// Cells are mapped to triangle coordinates (a, b, c) with a + b + c = 2
/// for upward and 1 for downward triangles; a 60-degree rotation is
/// (a, b, c) -> (1 - c, 1 - a, 1 - b) and a mirror swaps two axes.
pub fn trigon_orientations(cells: &[(i32, i32)]) -> Vec<Vec<(i32, i32)>> {
    let mut out = Vec::with_capacity(12);
    let mut tri: Vec<(i32, i32, i32)> = cells.iter().map(|&(x, y)| to_tri(x, y)).collect();
    for _ in 0..6 {
        out.push(tri.iter().map(|&t| from_tri(t)).collect());
        out.push(tri.iter().map(|&(a, b, c)| from_tri((a, c, b))).collect());
        tri = tri.iter().map(|&(a, b, c)| (1 - c, 1 - a, 1 - b)).collect();
    }
    out
}

fn to_tri(x: i32, y: i32) -> (i32, i32, i32) {
    let sum = 2 - ((x + y) & 1);
    ((sum + y + x) / 2, -y, (sum + y - x) / 2)
}

fn from_tri((a, b, c): (i32, i32, i32)) -> (i32, i32) {
    (a - c, -b)
}

/// Translation-normalizes a trigon cell set and picks the smallest form
/// over all 12 orientations. Trigon translations must keep `x + y` parity.
fn canonical_trigon(cells: &[(i32, i32)]) -> Vec<(i32, i32)> {
    trigon_orientations(cells)
        .into_iter()
        .map(|o| normalize_trigon(&o))
        .min()
        .unwrap()
}

fn normalize_trigon(cells: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let min_x = cells.iter().map(|&(x, _)| x).min().unwrap();
    let min_y = cells.iter().map(|&(_, y)| y).min().unwrap();
    let dy = -min_y;
    let mut dx = -min_x;
    if (dx + dy) & 1 == 1 {
        dx += 1;
    }
    let mut out: Vec<(i32, i32)> = cells.iter().map(|&(x, y)| (x + dx, y + dy)).collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_set_census() {
        let shapes = classic_shapes();
        assert_eq!(shapes.len(), 21);
        let total: usize = shapes.iter().map(|s| s.cells.len()).sum();
        assert_eq!(total, 89);
        for s in &shapes {
            let unique: HashSet<_> = s.cells.iter().collect();
            assert_eq!(unique.len(), s.cells.len(), "{} repeats a cell", s.name);
        }
    }

    #[test]
    fn junior_set_census() {
        assert_eq!(junior_shapes().len(), 12);
    }

    #[test]
    fn polyiamond_census() {
        let shapes = trigon_shapes();
        assert_eq!(shapes.len(), 22);
        let mut by_size = [0usize; MAX_PIECE_SIZE + 1];
        for s in &shapes {
            by_size[s.cells.len()] += 1;
        }
        assert_eq!(&by_size[1..], &[1, 1, 1, 3, 4, 12]);
    }

    #[test]
    fn square_orientation_counts() {
        let shapes = classic_shapes();
        let count = |name: &str| {
            let s = shapes.iter().find(|s| s.name == name).unwrap();
            square_orientations(&s.cells)
                .iter()
                .map(|o| {
                    let min_x = o.iter().map(|&(x, _)| x).min().unwrap();
                    let min_y = o.iter().map(|&(_, y)| y).min().unwrap();
                    let mut n: Vec<_> =
                        o.iter().map(|&(x, y)| (x - min_x, y - min_y)).collect();
                    n.sort();
                    n
                })
                .collect::<HashSet<_>>()
                .len()
        };
        assert_eq!(count("X"), 1);
        assert_eq!(count("O4"), 1);
        assert_eq!(count("I5"), 2);
        assert_eq!(count("T4"), 4);
        assert_eq!(count("F"), 8);
    }

    #[test]
    fn trigon_rotation_has_order_six() {
        let cells = [(0, 0), (1, 0), (2, 0), (2, 1)];
        let orientations = trigon_orientations(&cells);
        assert_eq!(orientations.len(), 12);
        let distinct: HashSet<_> =
            orientations.iter().map(|o| normalize_trigon(o)).collect();
        assert!(distinct.len() == 6 || distinct.len() == 12);
        for o in &orientations {
            assert_eq!(o.len(), cells.len());
        }
    }

    #[test]
    fn piece_mask_roundtrip() {
        let mut m = PieceMask::empty();
        m.set(0);
        m.set(5);
        m.set(21);
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![0, 5, 21]);
        assert!(PieceMask::all(22).contains(21));
        assert!(!PieceMask::all(21).contains(21));
        assert_eq!(m.intersect(PieceMask::all(6)).iter().collect::<Vec<_>>(), vec![0, 5]);
    }
}
