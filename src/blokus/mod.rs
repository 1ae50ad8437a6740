/*
 *  The Blokus game layer: variants, board geometry, pieces, and the
 *  precomputed move tables the search core runs on.
 */

pub mod board;
pub mod board_const;
pub mod geometry;
pub mod piece;
pub mod variant;

pub mod prelude {
    pub use super::{
        board::{Board, ColorMove, PointState},
        board_const::{BoardConst, Move, MoveCandidate, MoveInfo, MoveInfoExt, PieceInfo},
        geometry::{Geometry, Grid, Point, PointList},
        piece::{Piece, PieceMask, MAX_PIECE_SIZE},
        variant::{BoardType, Color, ColorMap, Variant, MAX_COLORS, MAX_RESULTS},
    };
}
