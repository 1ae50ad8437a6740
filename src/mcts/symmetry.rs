use crate::blokus::prelude::*;

/// The cell state the mirror strategy expects opposite a given state:
/// the paired color, or empty for empty.
fn symmetric_state(s: PointState) -> PointState {
    match s.to_color() {
        None => PointState::empty(),
        Some(c) => PointState::from(Color(c.0 ^ 1)),
    }
}

/// Whether the copying strategy is already dead in the root position.
///
/// With a first-player color to move the position itself must be
/// symmetric. With a second-player color to move, asymmetry is allowed
/// exactly at the cells of the first player's last move, which the copier
/// could still mirror. Non-alternating or empty histories on the second
/// player's turn are conservatively treated as broken.
pub fn is_root_symmetry_broken(bd: &Board<'_>) -> bool {
    let Some(map) = bd.consts().symmetric_points() else {
        return true;
    };
    let geo = bd.consts().geometry();
    let to_play = bd.to_play();
    if to_play.0 & 1 == 0 {
        for p in geo.iter() {
            if bd.point_state(p) != symmetric_state(bd.point_state(map[p])) {
                return true;
            }
        }
        return false;
    }

    let nu_moves = bd.nu_moves();
    if nu_moves == 0 {
        return true;
    }
    let last = bd.get_move(nu_moves - 1);
    if last.color != Color(to_play.0 ^ 1) {
        return true;
    }
    let points: Option<&[Point]> = if last.mv.is_null() {
        None
    } else {
        Some(bd.consts().move_info(last.mv).points())
    };
    for p in geo.iter() {
        let s1 = bd.point_state(p);
        let s2 = bd.point_state(map[p]);
        if s1 == symmetric_state(s2) {
            continue;
        }
        if let Some(points) = points {
            let copier_can_fix = (points.contains(&p)
                && s1.to_color() == Some(last.color)
                && s2.is_empty())
                || (points.contains(&map[p])
                    && s1.is_empty()
                    && s2.to_color() == Some(last.color));
            if copier_can_fix {
                continue;
            }
        }
        return true;
    }
    false
}

/// Updates the symmetry-broken flag after `mv` was played by `mover`.
///
/// A first-player color keeps the mirror strategy alive only while every
/// reflected cell of its move stays empty for the copier; a second-player
/// color only when its move lands exactly on the reflection of cells the
/// paired color already occupies.
pub fn update_symmetry_broken(bd: &Board<'_>, mv: Move, mover: Color, broken: &mut bool) {
    if *broken {
        return;
    }
    let Some(map) = bd.consts().symmetric_points() else {
        *broken = true;
        return;
    };
    let points = bd.consts().move_info(mv).points();
    if mover.0 & 1 == 0 {
        for &p in points {
            if !bd.point_state(map[p]).is_empty() {
                *broken = true;
                return;
            }
        }
    } else {
        let paired = Color(mover.0 ^ 1);
        for &p in points {
            if bd.point_state(map[p]).to_color() != Some(paired) {
                *broken = true;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror_of(bd: &Board<'_>, mv: Move) -> Move {
        bd.consts().move_info_ext(mv).symmetric_move
    }

    #[test]
    fn empty_root_is_symmetric() {
        let bc = BoardConst::new(Variant::Duo);
        let bd = Board::new(&bc);
        assert!(!is_root_symmetry_broken(&bd));
    }

    #[test]
    fn mirrored_reply_keeps_symmetry() {
        let bc = BoardConst::new(Variant::Duo);
        let mut bd = Board::new(&bc);
        let mut broken = false;

        let sp = bd.starting_points(Color(0))[0];
        let mv = bc.moves(10, sp, 0).find(|&m| bd.is_legal(Color(0), m)).unwrap();
        bd.play(Color(0), mv).unwrap();
        update_symmetry_broken(&bd, mv, Color(0), &mut broken);
        assert!(!broken, "reflection of the first move is empty");

        let reply = mirror_of(&bd, mv);
        assert!(bd.is_legal(Color(1), reply));
        bd.play(Color(1), reply).unwrap();
        update_symmetry_broken(&bd, reply, Color(1), &mut broken);
        assert!(!broken, "copier mirrored exactly");

        // A position reached by pure mirroring scans as symmetric.
        assert!(!is_root_symmetry_broken(&bd));
    }

    #[test]
    fn non_mirrored_reply_breaks_symmetry() {
        let bc = BoardConst::new(Variant::Duo);
        let mut bd = Board::new(&bc);
        let mut broken = false;

        let sp = bd.starting_points(Color(0))[0];
        let mv = bc.moves(10, sp, 0).find(|&m| bd.is_legal(Color(0), m)).unwrap();
        bd.play(Color(0), mv).unwrap();
        update_symmetry_broken(&bd, mv, Color(0), &mut broken);

        let other = bd.starting_points(Color(1))[0];
        let reply = bc.moves(0, other, 0).find(|&m| bd.is_legal(Color(1), m)).unwrap();
        assert_ne!(reply, mirror_of(&bd, mv));
        bd.play(Color(1), reply).unwrap();
        update_symmetry_broken(&bd, reply, Color(1), &mut broken);
        assert!(broken);
    }

    #[test]
    fn self_overlapping_reflection_is_a_symmetry_breaker() {
        let bc = BoardConst::new(Variant::Duo);
        let map = bc.symmetric_points().unwrap();
        let geo = bc.geometry();

        // The square piece over the central 2x2 covers its own
        // reflection; a leader playing it denies the mirror reply.
        let center = [(6, 6), (7, 6), (6, 7), (7, 7)];
        let cells: Vec<Point> = center.iter().map(|&(x, y)| geo.find(x, y).unwrap()).collect();
        let o4 = (0..bc.nu_moves())
            .map(Move::from_index)
            .find(|&mv| {
                let mut pts = bc.move_info(mv).points().to_vec();
                pts.sort();
                let mut want = cells.clone();
                want.sort();
                pts == want
            })
            .unwrap();
        assert!(bc.move_info_ext(o4).breaks_symmetry);

        // A border placement reflects onto free cells and keeps the
        // mirror strategy available.
        let sp = bc.starting_points(Color(0))[0];
        let edge = bc.moves(10, sp, 0).next().unwrap();
        assert!(!bc.move_info_ext(edge).breaks_symmetry);
        for &p in bc.move_info(edge).points() {
            assert!(!bc.move_info(edge).points().contains(&map[p]));
        }
    }

    #[test]
    fn root_scan_allows_only_last_move_asymmetry() {
        let bc = BoardConst::new(Variant::Duo);
        let mut bd = Board::new(&bc);

        // Leader moved, copier to play: asymmetric only at the leader's
        // cells, which the copier can still mirror.
        let sp = bd.starting_points(Color(0))[0];
        let mv = bc.moves(10, sp, 0).find(|&m| bd.is_legal(Color(0), m)).unwrap();
        bd.play(Color(0), mv).unwrap();
        assert!(!is_root_symmetry_broken(&bd));

        // One more leader move without a copy in between is beyond
        // repair for the scan (leader to move, position asymmetric).
        let p = bd
            .attach_points(Color(0))
            .iter()
            .copied()
            .find(|&p| !bd.is_forbidden(p, Color(0)))
            .unwrap();
        let status = bd.adj_status(p, Color(0));
        let next = bc
            .moves(0, p, status)
            .find(|&m| bd.is_legal(Color(0), m))
            .unwrap();
        bd.set_to_play(Color(0));
        bd.play(Color(0), next).unwrap();
        bd.set_to_play(Color(0));
        assert!(is_root_symmetry_broken(&bd));
    }
}
