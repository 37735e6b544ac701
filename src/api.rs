//! Request/response boundary to the rule/AI/verification engine. Wire
//! payloads are duck-typed on the server side; everything is decoded here
//! into tagged outcome enums so callers dispatch exhaustively.

use std::fmt;

use serde::Deserialize;

use crate::types::{BoardGrid, Difficulty, GameSnapshot, Move, Player, Position, Winner};
use crate::verify::VerificationReport;

#[cfg(target_arch = "wasm32")]
pub mod http;

/// Failures crossing the engine boundary. None are fatal to the client;
/// every path returns control to last-known-good interactivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport failed. Surfaced to the user, never retried.
    Network(String),
    /// The response arrived but did not match the expected shape.
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Decode(msg) => write!(f, "bad engine response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Legality answer for the side to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalMoves {
    pub positions: Vec<Position>,
    pub should_skip_turn: bool,
    pub to_move: Option<Player>,
}

/// A move the engine accepted, plus the partial verification that came with
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedMove {
    pub mv: Move,
    pub verification: Option<VerificationReport>,
}

/// `submitMove` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted(AcceptedMove),
    /// Rejected by the rule engine; recovered locally with no state change.
    Rejected {
        verification: Option<VerificationReport>,
    },
}

/// `requestAiMove` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiMoveOutcome {
    Moved(AcceptedMove),
    /// The AI has no legal move; control passes back to the human.
    SkipTurn {
        verification: Option<VerificationReport>,
        message: String,
    },
    /// Neither side can move.
    GameOver {
        winner: Option<Winner>,
        verification: Option<VerificationReport>,
        message: String,
    },
    Failed {
        verification: Option<VerificationReport>,
        message: String,
    },
}

/// One alternative placement in an advisor reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub position: Position,
    pub explanation: String,
}

/// A concrete advisor recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub position: Position,
    pub explanation: String,
    pub alternatives: Vec<Alternative>,
    /// The advisor fell back to heuristic evaluation; display-only.
    pub is_heuristic: bool,
    pub solving_time_ms: Option<u64>,
    pub win_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdviceOutcome {
    Move(Advice),
    /// No recommendation; the advisor's message is surfaced verbatim.
    NoMove { message: String },
}

/// Last-move metadata used by the recovery procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastMoveInfo {
    pub last_move: Option<Position>,
    pub flipped: Vec<Position>,
    pub last_mover: Option<Player>,
}

/// The engine boundary. One implementation speaks HTTP from the browser;
/// tests substitute their own.
pub trait EngineApi {
    async fn snapshot(&self) -> Result<GameSnapshot, ClientError>;
    async fn legal_moves(&self) -> Result<LegalMoves, ClientError>;
    async fn submit_move(&self, pos: Position) -> Result<MoveOutcome, ClientError>;
    async fn ai_move(&self) -> Result<AiMoveOutcome, ClientError>;
    async fn verification(&self) -> Result<VerificationReport, ClientError>;
    async fn advice(&self) -> Result<AdviceOutcome, ClientError>;
    async fn set_difficulty(
        &self,
        difficulty: Difficulty,
        restart: bool,
    ) -> Result<(), ClientError>;
    async fn restart(&self) -> Result<(), ClientError>;
    async fn last_move_info(&self) -> Result<LastMoveInfo, ClientError>;
}

// --- wire DTOs -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BoardDto {
    pub board: Vec<Vec<i8>>,
    pub current_player: i8,
    pub black_count: u8,
    pub white_count: u8,
    #[serde(default)]
    pub winner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidMovesDto {
    pub valid_moves: Vec<(u8, u8)>,
    #[serde(default)]
    pub should_skip_turn: bool,
    #[serde(default)]
    pub current_player: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveResponseDto {
    pub success: bool,
    #[serde(rename = "lastMove")]
    pub last_move: Option<(u8, u8)>,
    #[serde(default, rename = "flippedDiscs")]
    pub flipped_discs: Option<Vec<(u8, u8)>>,
    #[serde(default)]
    pub verification: Option<VerificationReport>,
    #[serde(default)]
    pub player: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AiMoveResponseDto {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub skip_turn: Option<bool>,
    #[serde(default)]
    pub game_over: Option<bool>,
    #[serde(rename = "lastMove", default)]
    pub last_move: Option<(u8, u8)>,
    #[serde(default, rename = "flippedDiscs")]
    pub flipped_discs: Option<Vec<(u8, u8)>>,
    #[serde(default)]
    pub verification: Option<VerificationReport>,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyResponseDto {
    pub verification: VerificationReport,
}

#[derive(Debug, Deserialize)]
pub struct AdviceAlternativeDto {
    #[serde(default)]
    pub row: Option<u8>,
    #[serde(default)]
    pub col: Option<u8>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SolvingDetailsDto {
    #[serde(default)]
    pub solving_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AdviceResponseDto {
    pub has_move: bool,
    #[serde(default)]
    pub best_move: Option<(u8, u8)>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub all_moves: Option<Vec<AdviceAlternativeDto>>,
    #[serde(default)]
    pub is_heuristic: Option<bool>,
    #[serde(default)]
    pub solving_details: Option<SolvingDetailsDto>,
    #[serde(default)]
    pub win_probability: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LastMoveInfoDto {
    #[serde(default)]
    pub last_move: Option<(u8, u8)>,
    #[serde(default)]
    pub flipped_discs: Option<Vec<(u8, u8)>>,
    #[serde(default)]
    pub last_player: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AckDto {
    pub success: bool,
}

// --- DTO -> domain conversions ---------------------------------------------

fn decode_err(what: &str) -> ClientError {
    ClientError::Decode(what.to_string())
}

fn positions(pairs: Option<Vec<(u8, u8)>>) -> Vec<Position> {
    pairs
        .unwrap_or_default()
        .into_iter()
        .map(Position::from)
        .collect()
}

fn mover_from(name: Option<&str>) -> Option<Player> {
    name.and_then(Player::from_name)
}

fn winner_from(name: Option<&str>) -> Result<Option<Winner>, ClientError> {
    match name {
        None => Ok(None),
        Some(name) => Winner::from_name(name)
            .map(Some)
            .ok_or_else(|| decode_err("unknown winner name")),
    }
}

pub fn snapshot_from(dto: BoardDto) -> Result<GameSnapshot, ClientError> {
    Ok(GameSnapshot {
        board: BoardGrid::from_rows(&dto.board).map_err(ClientError::Decode)?,
        current_player: Player::from_signed(dto.current_player)
            .ok_or_else(|| decode_err("invalid current_player"))?,
        black_count: dto.black_count,
        white_count: dto.white_count,
        winner: winner_from(dto.winner.as_deref())?,
    })
}

pub fn legal_moves_from(dto: ValidMovesDto) -> LegalMoves {
    LegalMoves {
        positions: dto.valid_moves.into_iter().map(Position::from).collect(),
        should_skip_turn: dto.should_skip_turn,
        to_move: mover_from(dto.current_player.as_deref()),
    }
}

pub fn move_outcome_from(dto: MoveResponseDto) -> Result<MoveOutcome, ClientError> {
    if !dto.success {
        return Ok(MoveOutcome::Rejected {
            verification: dto.verification,
        });
    }
    let position = dto
        .last_move
        .map(Position::from)
        .ok_or_else(|| decode_err("accepted move without lastMove"))?;
    let mover = mover_from(dto.player.as_deref()).unwrap_or(Player::Black);
    Ok(MoveOutcome::Accepted(AcceptedMove {
        mv: Move {
            position,
            flipped: positions(dto.flipped_discs),
            mover,
        },
        verification: dto.verification,
    }))
}

pub fn ai_outcome_from(dto: AiMoveResponseDto) -> Result<AiMoveOutcome, ClientError> {
    let message = dto.message.clone().unwrap_or_default();
    if dto.skip_turn == Some(true) {
        return Ok(AiMoveOutcome::SkipTurn {
            verification: dto.verification,
            message,
        });
    }
    if dto.game_over == Some(true) {
        return Ok(AiMoveOutcome::GameOver {
            winner: winner_from(dto.winner.as_deref())?,
            verification: dto.verification,
            message,
        });
    }
    if dto.success == Some(true) {
        let position = dto
            .last_move
            .map(Position::from)
            .ok_or_else(|| decode_err("AI move without lastMove"))?;
        let mover = mover_from(dto.player.as_deref()).unwrap_or(Player::White);
        return Ok(AiMoveOutcome::Moved(AcceptedMove {
            mv: Move {
                position,
                flipped: positions(dto.flipped_discs),
                mover,
            },
            verification: dto.verification,
        }));
    }
    Ok(AiMoveOutcome::Failed {
        verification: dto.verification,
        message,
    })
}

pub fn advice_outcome_from(dto: AdviceResponseDto) -> Result<AdviceOutcome, ClientError> {
    if !dto.has_move {
        return Ok(AdviceOutcome::NoMove {
            message: dto
                .message
                .unwrap_or_else(|| "No valid move could be determined.".to_string()),
        });
    }
    let position = dto
        .best_move
        .map(Position::from)
        .ok_or_else(|| decode_err("advice without best_move"))?;
    let alternatives = dto
        .all_moves
        .unwrap_or_default()
        .into_iter()
        .filter_map(|alt| {
            let pos = Position::new(alt.row?, alt.col?);
            // The best move itself is echoed in all_moves; skip it.
            if pos == position {
                return None;
            }
            Some(Alternative {
                position: pos,
                explanation: alt.explanation?,
            })
        })
        .collect();
    Ok(AdviceOutcome::Move(Advice {
        position,
        explanation: dto.explanation.unwrap_or_default(),
        alternatives,
        is_heuristic: dto.is_heuristic.unwrap_or(false),
        solving_time_ms: dto
            .solving_details
            .unwrap_or_default()
            .solving_time
            .map(|ms| ms as u64),
        win_probability: dto.win_probability,
    }))
}

pub fn last_move_info_from(dto: LastMoveInfoDto) -> LastMoveInfo {
    LastMoveInfo {
        last_move: dto.last_move.map(Position::from),
        flipped: positions(dto.flipped_discs),
        last_mover: mover_from(dto.last_player.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_decodes_a_board_poll() {
        let raw = r#"{
            "board": [[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],
                      [0,0,0,-1,1,0,0,0],[0,0,0,1,-1,0,0,0],[0,0,0,0,0,0,0,0],
                      [0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0]],
            "current_player": 1,
            "black_count": 2,
            "white_count": 2,
            "winner": null
        }"#;
        let dto: BoardDto = serde_json::from_str(raw).unwrap();
        let snap = snapshot_from(dto).unwrap();

        assert_eq!(snap.current_player, Player::Black);
        assert_eq!(snap.board.get(Position::new(3, 4)), Some(Player::Black));
        assert_eq!(snap.board.get(Position::new(3, 3)), Some(Player::White));
        assert!(snap.winner.is_none());
    }

    #[test]
    fn snapshot_decodes_a_winner() {
        let raw = r#"{
            "board": [[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],
                      [0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],
                      [0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0]],
            "current_player": -1,
            "black_count": 40,
            "white_count": 24,
            "winner": "Black"
        }"#;
        let dto: BoardDto = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot_from(dto).unwrap().winner, Some(Winner::Black));
    }

    #[test]
    fn accepted_move_becomes_a_tagged_success() {
        let raw = r#"{
            "success": true,
            "lastMove": [2, 3],
            "flippedDiscs": [[3, 3]],
            "player": "black",
            "verification": {"legal_moves_black": {"status": "pass", "details": "ok"}}
        }"#;
        let dto: MoveResponseDto = serde_json::from_str(raw).unwrap();
        match move_outcome_from(dto).unwrap() {
            MoveOutcome::Accepted(accepted) => {
                assert_eq!(accepted.mv.position, Position::new(2, 3));
                assert_eq!(accepted.mv.flipped, vec![Position::new(3, 3)]);
                assert_eq!(accepted.mv.mover, Player::Black);
                assert!(accepted.verification.is_some());
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn rejected_move_keeps_its_verification() {
        let raw = r#"{"success": false,
                      "lastMove": null,
                      "verification": {"legal_moves_black": {"status": "fail", "details": "illegal"}}}"#;
        let dto: MoveResponseDto = serde_json::from_str(raw).unwrap();
        match move_outcome_from(dto).unwrap() {
            MoveOutcome::Rejected { verification } => assert!(verification.is_some()),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn ai_response_dispatches_all_four_cases() {
        let moved: AiMoveResponseDto = serde_json::from_str(
            r#"{"success": true, "lastMove": [5, 4], "flippedDiscs": [[4, 4]], "player": "white"}"#,
        )
        .unwrap();
        assert!(matches!(
            ai_outcome_from(moved).unwrap(),
            AiMoveOutcome::Moved(_)
        ));

        let skip: AiMoveResponseDto = serde_json::from_str(
            r#"{"success": true, "skip_turn": true, "message": "AI has no valid moves. Your turn."}"#,
        )
        .unwrap();
        match ai_outcome_from(skip).unwrap() {
            AiMoveOutcome::SkipTurn { message, .. } => {
                assert_eq!(message, "AI has no valid moves. Your turn.")
            }
            other => panic!("expected SkipTurn, got {other:?}"),
        }

        let over: AiMoveResponseDto = serde_json::from_str(
            r#"{"success": false, "game_over": true, "winner": "Draw", "message": "Game over."}"#,
        )
        .unwrap();
        match ai_outcome_from(over).unwrap() {
            AiMoveOutcome::GameOver { winner, .. } => assert_eq!(winner, Some(Winner::Draw)),
            other => panic!("expected GameOver, got {other:?}"),
        }

        let failed: AiMoveResponseDto =
            serde_json::from_str(r#"{"success": false, "message": "engine exploded"}"#).unwrap();
        assert!(matches!(
            ai_outcome_from(failed).unwrap(),
            AiMoveOutcome::Failed { .. }
        ));
    }

    #[test]
    fn advice_filters_the_echoed_best_move() {
        let raw = r#"{
            "has_move": true,
            "best_move": [2, 4],
            "explanation": "Takes the edge.",
            "is_heuristic": true,
            "all_moves": [
                {"row": 2, "col": 4, "explanation": "Takes the edge."},
                {"row": 5, "col": 3, "explanation": "Builds mobility."},
                {"row": 1, "col": 1}
            ],
            "solving_details": {"solving_time": 412.7}
        }"#;
        let dto: AdviceResponseDto = serde_json::from_str(raw).unwrap();
        match advice_outcome_from(dto).unwrap() {
            AdviceOutcome::Move(advice) => {
                assert_eq!(advice.position, Position::new(2, 4));
                assert!(advice.is_heuristic);
                assert_eq!(advice.solving_time_ms, Some(412));
                assert_eq!(advice.alternatives.len(), 1);
                assert_eq!(advice.alternatives[0].position, Position::new(5, 3));
            }
            other => panic!("expected Move, got {other:?}"),
        }
    }

    #[test]
    fn advice_without_a_move_surfaces_the_message() {
        let dto: AdviceResponseDto =
            serde_json::from_str(r#"{"has_move": false, "message": "No moves left."}"#).unwrap();
        match advice_outcome_from(dto).unwrap() {
            AdviceOutcome::NoMove { message } => assert_eq!(message, "No moves left."),
            other => panic!("expected NoMove, got {other:?}"),
        }
    }

    #[test]
    fn last_move_info_tolerates_an_empty_reply() {
        let dto: LastMoveInfoDto = serde_json::from_str("{}").unwrap();
        let info = last_move_info_from(dto);
        assert_eq!(info, LastMoveInfo::default());

        let dto: LastMoveInfoDto = serde_json::from_str(
            r#"{"last_move": [3, 2], "flipped_discs": [[3, 3], [3, 4]], "last_player": "black"}"#,
        )
        .unwrap();
        let info = last_move_info_from(dto);
        assert_eq!(info.last_move, Some(Position::new(3, 2)));
        assert_eq!(info.flipped.len(), 2);
        assert_eq!(info.last_mover, Some(Player::Black));
    }
}
