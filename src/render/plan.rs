//! Pure per-cell render planning. The DOM layer applies these patches
//! verbatim, so everything observable about a frame is decided (and
//! testable) here.

use crate::types::{BOARD_SIZE, GameSnapshot, Move, Player, Position};

/// What one cell should show for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellPatch {
    pub disc: Option<Player>,
    /// The disc placed by the last move; drawn with the last-move marker.
    pub just_placed: bool,
    /// Flipped by the last move and currently shown in final color.
    pub flip_marker: bool,
    /// Run the flip transition this frame.
    pub flip_animating: bool,
    /// Legal-move highlight for the side to move.
    pub legal: bool,
}

/// Plans all 64 cells for one reveal frame.
///
/// With `reveal_flip` false, cells flipped by `last_move` are drawn in their
/// pre-flip color (the opposite of the snapshot value) so the caller can
/// render the "just placed, not yet flipped" instant. Legal highlights are
/// drawn only when `legality_owner` matches the snapshot's side to move.
pub fn plan_cells(
    snapshot: &GameSnapshot,
    last_move: Option<&Move>,
    reveal_flip: bool,
    legal: &[Position],
    legality_owner: Option<Player>,
) -> [[CellPatch; BOARD_SIZE]; BOARD_SIZE] {
    let legal_active =
        legality_owner.is_some_and(|owner| owner == snapshot.current_player) && !snapshot.is_over();

    let mut cells = [[CellPatch::default(); BOARD_SIZE]; BOARD_SIZE];
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let pos = Position::new(row as u8, col as u8);
            let mut patch = CellPatch {
                disc: snapshot.board.get(pos),
                ..CellPatch::default()
            };

            if let Some(mv) = last_move {
                let flipped = mv.flipped.contains(&pos);
                if flipped {
                    if reveal_flip {
                        patch.flip_marker = true;
                        patch.flip_animating = true;
                    } else if patch.disc.is_some() {
                        patch.disc = Some(mv.mover.opponent());
                    }
                }
                if mv.position == pos {
                    patch.just_placed = true;
                }
            }

            if legal_active && legal.contains(&pos) {
                patch.legal = true;
            }

            cells[row][col] = patch;
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoardGrid;

    // Board after black plays (2, 3) on the opening position, flipping (3, 3).
    fn after_opening_move() -> (GameSnapshot, Move) {
        let mut board = BoardGrid::empty();
        board.set(Position::new(3, 4), Some(Player::Black));
        board.set(Position::new(4, 3), Some(Player::Black));
        board.set(Position::new(4, 4), Some(Player::White));
        board.set(Position::new(2, 3), Some(Player::Black));
        board.set(Position::new(3, 3), Some(Player::Black));
        let snapshot = GameSnapshot {
            board,
            current_player: Player::White,
            black_count: 4,
            white_count: 1,
            winner: None,
        };
        let mv = Move {
            position: Position::new(2, 3),
            flipped: vec![Position::new(3, 3)],
            mover: Player::Black,
        };
        (snapshot, mv)
    }

    #[test]
    fn placement_frame_shows_flipped_cells_in_preflip_color() {
        let (snapshot, mv) = after_opening_move();
        let cells = plan_cells(&snapshot, Some(&mv), false, &[], None);

        // The new disc is there and marked, but its capture still shows white.
        assert_eq!(cells[2][3].disc, Some(Player::Black));
        assert!(cells[2][3].just_placed);
        assert_eq!(cells[3][3].disc, Some(Player::White));
        assert!(!cells[3][3].flip_marker);
        assert!(!cells[3][3].flip_animating);
    }

    #[test]
    fn flip_frame_shows_final_colors_with_animation_markers() {
        let (snapshot, mv) = after_opening_move();
        let cells = plan_cells(&snapshot, Some(&mv), true, &[], None);

        assert_eq!(cells[3][3].disc, Some(Player::Black));
        assert!(cells[3][3].flip_marker);
        assert!(cells[3][3].flip_animating);
        // Untouched discs never animate.
        assert!(!cells[4][4].flip_marker);
        assert_eq!(cells[4][4].disc, Some(Player::White));
    }

    #[test]
    fn legal_highlights_only_for_the_side_to_move() {
        let (snapshot, mv) = after_opening_move();
        let legal = [Position::new(2, 2), Position::new(2, 4)];

        // White to move; black-owned highlights must not appear.
        let cells = plan_cells(&snapshot, Some(&mv), true, &legal, Some(Player::Black));
        assert!(!cells[2][2].legal);

        let cells = plan_cells(&snapshot, Some(&mv), true, &legal, Some(Player::White));
        assert!(cells[2][2].legal);
        assert!(cells[2][4].legal);
        assert!(!cells[5][5].legal);
    }

    #[test]
    fn no_highlights_once_the_game_is_over() {
        let (mut snapshot, mv) = after_opening_move();
        snapshot.winner = Some(crate::types::Winner::Black);

        let legal = [Position::new(2, 2)];
        let cells = plan_cells(&snapshot, Some(&mv), true, &legal, Some(Player::White));
        assert!(!cells[2][2].legal);
    }

    #[test]
    fn frame_without_a_last_move_is_plain() {
        let (snapshot, _) = after_opening_move();
        let cells = plan_cells(&snapshot, None, true, &[], None);

        for row in cells.iter() {
            for patch in row.iter() {
                assert!(!patch.just_placed);
                assert!(!patch.flip_marker);
                assert!(!patch.legal);
            }
        }
    }
}
