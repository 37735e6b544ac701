use std::fmt;

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: usize = 8;
pub const INITIAL_DISCS: u8 = 4;
/// A finished game places at most 60 discs on top of the initial four.
pub const TOTAL_ROUNDS: u8 = 60;

/// The two sides. Black is always the human player, White the engine AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    pub fn is_human(self) -> bool {
        self == Self::Black
    }

    /// Wire name used by the engine in `player` / `current_player` fields.
    pub fn as_name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "black" => Some(Self::Black),
            "white" => Some(Self::White),
            _ => None,
        }
    }

    /// Snapshot encoding: black = 1, white = -1.
    pub fn from_signed(value: i8) -> Option<Self> {
        match value {
            1 => Some(Self::Black),
            -1 => Some(Self::White),
            _ => None,
        }
    }
}

/// A board coordinate. Serialized as a `[row, col]` pair to match the wire
/// format of `lastMove` and `flippedDiscs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(u8, u8)", into = "(u8, u8)")]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }
}

impl From<(u8, u8)> for Position {
    fn from((row, col): (u8, u8)) -> Self {
        Self { row, col }
    }
}

impl From<Position> for (u8, u8) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Final game result as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Black,
    White,
    Draw,
}

impl Winner {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Black" => Some(Self::Black),
            "White" => Some(Self::White),
            "Draw" => Some(Self::Draw),
            _ => None,
        }
    }

    pub fn banner(self) -> &'static str {
        match self {
            Self::Black => "You Win",
            Self::White => "AI Wins",
            Self::Draw => "Draw",
        }
    }
}

/// Logical board contents, decoded from one snapshot poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGrid {
    cells: [[Option<Player>; BOARD_SIZE]; BOARD_SIZE],
}

impl BoardGrid {
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Decodes the engine's row-major grid of {1, -1, 0} cell values.
    pub fn from_rows(rows: &[Vec<i8>]) -> Result<Self, String> {
        if rows.len() != BOARD_SIZE {
            return Err(format!(
                "expected {BOARD_SIZE} board rows, got {}",
                rows.len()
            ));
        }
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for (r, row) in rows.iter().enumerate() {
            if row.len() != BOARD_SIZE {
                return Err(format!("board row {r} has {} cells", row.len()));
            }
            for (c, &value) in row.iter().enumerate() {
                cells[r][c] = match value {
                    0 => None,
                    other => Some(
                        Player::from_signed(other)
                            .ok_or_else(|| format!("invalid cell value {other} at ({r}, {c})"))?,
                    ),
                };
            }
        }
        Ok(Self { cells })
    }

    pub fn get(&self, pos: Position) -> Option<Player> {
        self.cells[pos.row as usize][pos.col as usize]
    }

    pub fn set(&mut self, pos: Position, value: Option<Player>) {
        self.cells[pos.row as usize][pos.col as usize] = value;
    }
}

/// Immutable copy of the engine's authoritative state, replaced wholesale
/// after every state-changing call. Never patched field-by-field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board: BoardGrid,
    pub current_player: Player,
    pub black_count: u8,
    pub white_count: u8,
    pub winner: Option<Winner>,
}

impl GameSnapshot {
    pub fn total_discs(&self) -> u8 {
        self.black_count + self.white_count
    }

    /// Rounds played so far, counted from the four starting discs.
    pub fn rounds_played(&self) -> u8 {
        self.total_discs().saturating_sub(INITIAL_DISCS)
    }

    /// One-based number of the round in progress, shown in the banner.
    pub fn round_number(&self) -> u8 {
        self.rounds_played() + 1
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Turn-indicator text. Terminal results take precedence over turns.
    pub fn banner(&self) -> String {
        match self.winner {
            Some(winner) => winner.banner().to_string(),
            None if self.current_player.is_human() => {
                format!("Your Turn - Round {}", self.round_number())
            }
            None => format!("AI's Turn - Round {}", self.round_number()),
        }
    }
}

/// One accepted placement, consumed once by the reveal sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub position: Position,
    pub flipped: Vec<Position>,
    pub mover: Player,
}

/// One row of the move log: the human's placement and the AI reply that
/// followed it, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLogEntry {
    pub human: Option<Position>,
    pub ai: Option<Position>,
}

/// AI strength, chosen by the user and pushed to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Hard => "hard",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "easy" => Some(Self::Easy),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}
