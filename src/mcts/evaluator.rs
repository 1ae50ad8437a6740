use crate::blokus::prelude::*;
use crate::mcts::Float;

/// Odd, cheap squashing function; no exp on the evaluation path.
#[inline]
pub fn fast_sigmoid(x: f64) -> f64 {
    x / (1.0 + x.abs())
}

/// Running mean and deviation (Welford), one value stream per statistic.
#[derive(Clone, Copy, Debug, Default)]
pub struct Statistics {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Statistics {
    pub fn clear(&mut self) {
        *self = Statistics::default();
    }

    pub fn add(&mut self, v: f64) {
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn deviation(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f64).sqrt()
    }
}

const LENGTH_BONUS_WEIGHT: f64 = 0.06;
const SCORE_BONUS_WEIGHT: f64 = 0.3;

/// Maps terminal (and early-terminated) positions to per-color result
/// values, with the length and score bonuses of Pepels et al. (ECAI
/// 2014) layered on the raw game result. Running statistics are owned by
/// the enclosing state, one instance per worker.
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
    stat_len: Statistics,
    stat_score: ColorMap<Statistics>,
}

impl Evaluator {
    pub fn clear(&mut self) {
        self.stat_len.clear();
        for s in self.stat_score.iter_mut() {
            s.clear();
        }
    }

    pub fn stat_len(&self) -> &Statistics {
        &self.stat_len
    }

    pub fn stat_score(&self, c: Color) -> &Statistics {
        &self.stat_score[c]
    }

    /// Length term: shorter wins and longer losses rate higher.
    /// Score term: bigger margins rate higher, win or lose.
    fn bonus(&self, c: Color, game_result: Float, length: f64, score: f64) -> Float {
        let mut bonus = 0.0;
        let len_dev = self.stat_len.deviation();
        if len_dev > 0.0 {
            let sign = if game_result > 0.5 {
                -1.0
            } else if game_result < 0.5 {
                1.0
            } else {
                0.0
            };
            bonus += sign
                * LENGTH_BONUS_WEIGHT
                * fast_sigmoid((length - self.stat_len.mean()) / len_dev);
        }
        let score_dev = self.stat_score[c].deviation();
        if score_dev > 0.0 {
            bonus += SCORE_BONUS_WEIGHT
                * fast_sigmoid((score - self.stat_score[c].mean()) / score_dev);
        }
        bonus as Float
    }

    /// Evaluates the current position of `bd` into one value per result
    /// slot. `symmetric_draw` is true when the mirror heuristic decides
    /// the playout (unbroken symmetry past the piece threshold).
    pub fn evaluate(&mut self, bd: &Board<'_>, symmetric_draw: bool) -> [Float; MAX_RESULTS] {
        let mut result = [0.0; MAX_RESULTS];
        let variant = bd.variant();
        let nu_colors = variant.nu_colors();
        if symmetric_draw {
            for r in result.iter_mut().take(nu_colors) {
                *r = 0.5;
            }
            return result;
        }

        let length = bd.nu_moves() as f64;
        if variant.nu_players() == 2 {
            let score = bd.score(Color(0)) as f64;
            self.stat_len.add(length);
            self.stat_score[Color(0)].add(score);
            let raw: Float = if score > 0.0 {
                1.0
            } else if score < 0.0 {
                0.0
            } else {
                0.5
            };
            let r = raw + self.bonus(Color(0), raw, length, score);
            result[0] = r;
            result[1] = 1.0 - r;
            if nu_colors == 4 {
                result[2] = r;
                result[3] = 1.0 - r;
            }
            return result;
        }

        // Multiplayer: ranks share the mean of their positions, mapped to
        // [0, 1] in 1/(n-1) steps.
        let n = bd.nu_scored_colors();
        let mut scores = [0i32; MAX_COLORS];
        self.stat_len.add(length);
        for c in Color::all(n) {
            scores[c.index()] = bd.score(c);
            self.stat_score[c].add(scores[c.index()] as f64);
        }
        let mut bonuses = [0.0 as Float; MAX_COLORS];
        for c in Color::all(n) {
            let score = scores[c.index()];
            let mut below = 0u32;
            let mut tied = 0u32;
            for other in Color::all(n) {
                if other == c {
                    continue;
                }
                if scores[other.index()] < score {
                    below += 1;
                }
                if scores[other.index()] == score {
                    tied += 1;
                }
            }
            // Mean of the tied rank block, scaled by 1/(n-1).
            let rank = below as Float + tied as Float / 2.0;
            result[c.index()] = rank / (n - 1) as Float;
            bonuses[c.index()] = self.bonus(c, result[c.index()], length, score as f64);
        }
        // The rank values sum to n/2; the bonuses are centered so the
        // results keep that sum exactly.
        let mean_bonus = bonuses[..n].iter().sum::<Float>() / n as Float;
        for c in Color::all(n) {
            result[c.index()] += bonuses[c.index()] - mean_bonus;
        }
        if variant == Variant::Classic3 {
            for i in 0..3 {
                result[3 + i] = result[i];
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_track_mean_and_deviation() {
        let mut s = Statistics::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            s.add(v);
        }
        assert!((s.mean() - 5.0).abs() < 1e-12);
        assert!((s.deviation() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn fast_sigmoid_is_odd_and_bounded() {
        for x in [-10.0, -1.0, -0.25, 0.0, 0.25, 1.0, 10.0] {
            assert!((fast_sigmoid(x) + fast_sigmoid(-x)).abs() < 1e-15);
            assert!(fast_sigmoid(x).abs() < 1.0);
        }
    }

    fn board_with_scores<'c>(bc: &'c BoardConst, pieces: &[(Color, Piece)]) -> Board<'c> {
        let mut bd = Board::new(bc);
        for &(c, piece) in pieces {
            let sp = bd.starting_points(c)[0];
            let mv = bc
                .moves(piece, sp, 0)
                .find(|&m| bd.is_legal(c, m))
                .unwrap();
            bd.set_to_play(c);
            bd.play(c, mv).unwrap();
        }
        bd
    }

    #[test]
    fn two_player_results_sum_to_one() {
        let bc = BoardConst::new(Variant::Duo);
        let bd = board_with_scores(&bc, &[(Color(0), 10), (Color(1), 0)]);
        let mut eval = Evaluator::default();
        // Several evaluations so the bonus terms kick in.
        for _ in 0..5 {
            let result = eval.evaluate(&bd, false);
            assert!((result[0] + result[1] - 1.0).abs() < 1e-6);
            assert!(result[0] > 0.5, "five points up should read as a win");
        }
    }

    #[test]
    fn paired_colors_share_the_result() {
        let bc = BoardConst::new(Variant::Classic2);
        let bd = board_with_scores(&bc, &[(Color(0), 10), (Color(1), 0)]);
        let mut eval = Evaluator::default();
        let result = eval.evaluate(&bd, false);
        assert_eq!(result[0], result[2]);
        assert_eq!(result[1], result[3]);
        assert!((result[0] + result[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn classic3_rank_mapping_with_tie() {
        let bc = BoardConst::new(Variant::Classic3);
        // Colors 0 and 1 place five points each, color 2 a single point.
        let bd = board_with_scores(&bc, &[(Color(0), 10), (Color(1), 10), (Color(2), 0)]);
        let mut eval = Evaluator::default();
        let result = eval.evaluate(&bd, false);
        // First evaluation has no deviation yet, so bonuses are zero.
        assert_eq!(result[0], 0.75);
        assert_eq!(result[1], 0.75);
        assert_eq!(result[2], 0.0);
        assert_eq!(&result[3..6], &result[0..3]);
    }

    #[test]
    fn multiplayer_results_sum_to_half_the_field() {
        let bc = BoardConst::new(Variant::Classic);
        let bd = board_with_scores(
            &bc,
            &[(Color(0), 10), (Color(1), 4), (Color(2), 2), (Color(3), 0)],
        );
        let mut eval = Evaluator::default();
        let result = eval.evaluate(&bd, false);
        let sum: Float = result[..4].iter().sum();
        assert!((sum - 2.0).abs() < 1e-6);
        assert!(result[0] > result[1]);
        assert!(result[1] > result[2]);
        assert!(result[2] > result[3]);
    }

    #[test]
    fn multiplayer_sum_survives_live_bonuses() {
        let bc = BoardConst::new(Variant::Classic);
        let first = board_with_scores(
            &bc,
            &[(Color(0), 10), (Color(1), 4), (Color(2), 2), (Color(3), 0)],
        );
        // A second position with different scores and, via the passes, a
        // different playout length, so both bonus terms have deviation.
        let mut second = board_with_scores(
            &bc,
            &[(Color(0), 0), (Color(1), 10), (Color(2), 4), (Color(3), 2)],
        );
        second.play_pass(Color(0));
        second.play_pass(Color(1));

        let mut eval = Evaluator::default();
        eval.evaluate(&first, false);
        let mut last = [0.0 as Float; MAX_RESULTS];
        for _ in 0..3 {
            last = eval.evaluate(&second, false);
            let sum: Float = last[..4].iter().sum();
            assert!((sum - 2.0).abs() < 1e-5, "rank sum drifted to {sum}");
        }
        // The statistics are live by now and the bonuses nonzero: the
        // results must have moved off the raw rank values.
        assert!(eval.stat_len().deviation() > 0.0);
        let raw: [Float; 4] = [0.0, 1.0, 2.0 / 3.0, 1.0 / 3.0];
        assert!(last[..4]
            .iter()
            .zip(raw)
            .any(|(&r, base)| (r - base).abs() > 1e-4));
    }

    #[test]
    fn symmetric_draw_is_half_for_everyone() {
        let bc = BoardConst::new(Variant::Duo);
        let bd = Board::new(&bc);
        let mut eval = Evaluator::default();
        let result = eval.evaluate(&bd, true);
        assert_eq!(result[0], 0.5);
        assert_eq!(result[1], 0.5);
        // Symmetric draws bypass the running statistics.
        assert_eq!(eval.stat_len().count(), 0);
    }
}
