use crate::blokus::prelude::*;
use crate::mcts::playout_features::Compute;

/// Boost for moves adjacent to a local attach point without covering one.
const ADJ_ATTACH_GAMMA: f64 = 1e5;

/// Per-attach-count boost base for moves covering local attach points.
const NU_ATTACH_GAMMA: f64 = 1e10;

/// Static playout weights, derived from the variant once per search.
/// Sampling probability of a move is its gamma over the color's total.
#[derive(Clone, Debug, Default)]
pub struct Gamma {
    piece: Vec<f64>,
    nu_attach: [f64; MAX_PIECE_SIZE + 1],
}

impl Gamma {
    pub fn new(bc: &BoardConst) -> Gamma {
        // Big pieces dominate; on the small Duo board the attach-point
        // fanout of a piece matters more than raw size.
        let (size_factor, attach_factor): (f64, f64) = match bc.variant().board_type() {
            BoardType::Duo => (3.0, 1.8),
            _ => (5.0, 1.0),
        };
        let piece = (0..bc.nu_pieces())
            .map(|p| {
                let info = bc.piece_info(p);
                size_factor.powi(info.size as i32 - 1)
                    * attach_factor.powi(info.nu_attach as i32 - 1)
            })
            .collect();
        let nu_attach = std::array::from_fn(|i| NU_ATTACH_GAMMA.powi(i as i32));
        Gamma { piece, nu_attach }
    }

    /// Weight of a move given its piece and accumulated point features.
    #[inline]
    pub fn of(&self, piece: Piece, features: &Compute) -> f64 {
        debug_assert!(piece < self.piece.len());
        let base = unsafe { *self.piece.get_unchecked(piece) };
        if !features.has_local() {
            return base;
        }
        let local = self.nu_attach[features.nu_attach() as usize];
        if features.has_adj_attach() {
            base * local * ADJ_ATTACH_GAMMA
        } else {
            base * local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bigger_pieces_weigh_more() {
        let bc = BoardConst::new(Variant::Classic);
        let g = Gamma::new(&bc);
        let size = |name: &str| {
            (0..bc.nu_pieces())
                .find(|&p| bc.piece_info(p).name == name)
                .unwrap()
        };
        let quiet = Compute::from_raw(0, 0);
        let one = g.of(size("1"), &quiet);
        let five = g.of(size("X"), &quiet);
        assert_eq!(five / one, 5f64.powi(4));
    }

    #[test]
    fn adj_attach_boost_is_exactly_1e5() {
        let bc = BoardConst::new(Variant::Duo);
        let g = Gamma::new(&bc);
        // Two moves of the same piece, both local, differing only in the
        // adjacent-attach feature.
        let a = g.of(3, &Compute::from_raw(1, 2));
        let b = g.of(3, &Compute::from_raw(1, 0));
        assert!((a / b - 1e5).abs() < 1e-9 * 1e5);
    }

    #[test]
    fn covering_local_attach_points_compounds() {
        let bc = BoardConst::new(Variant::Duo);
        let g = Gamma::new(&bc);
        let none = g.of(5, &Compute::from_raw(0, 0));
        let once = g.of(5, &Compute::from_raw(1, 0));
        let twice = g.of(5, &Compute::from_raw(2, 0));
        assert_eq!(once / none, 1e10);
        assert_eq!(twice / once, 1e10);
    }
}
