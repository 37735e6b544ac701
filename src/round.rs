//! Engine-facing turn drivers, generic over [`EngineApi`] so the same
//! handoff logic runs under the browser transport and under a scripted
//! engine in host tests. Rendering and timer suspension stay with the
//! caller; these functions only talk to the engine and mutate the store.

use crate::api::{AiMoveOutcome, EngineApi, MoveOutcome};
use crate::store::StateStore;
use crate::types::Position;

/// Legal-move answer fetched at the end of a round, kept alongside the
/// follow-up so the caller can draw highlights at the interactive frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalUpdate {
    pub positions: Vec<Position>,
    pub owner: Option<crate::types::Player>,
    pub should_skip_turn: bool,
}

/// What the caller must do after one AI engine round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiRoundFollowUp {
    /// The AI placed a disc; walk the reveal frames. When the human has no
    /// reply, announce the skip and run another round after the
    /// observation delay.
    Reveal {
        human_must_skip: bool,
        game_over: bool,
    },
    /// The AI had no legal move; the human plays again at once.
    AiSkipped { message: String },
    GameOver { message: String },
    /// The request failed; the pre-round phase has been restored.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRound {
    pub follow_up: AiRoundFollowUp,
    pub legal: LegalUpdate,
}

async fn fetch_snapshot<E: EngineApi>(engine: &E, store: &mut StateStore) {
    match engine.snapshot().await {
        Ok(snapshot) => store.apply_snapshot(snapshot),
        Err(err) => log::error!("board poll failed: {err}"),
    }
}

async fn fetch_legal<E: EngineApi>(engine: &E, store: &StateStore) -> LegalUpdate {
    match engine.legal_moves().await {
        Ok(legal) => LegalUpdate {
            owner: legal
                .to_move
                .or_else(|| store.snapshot().map(|s| s.current_player)),
            positions: legal.positions,
            should_skip_turn: legal.should_skip_turn,
        },
        Err(err) => {
            log::error!("legal-moves query failed: {err}");
            LegalUpdate::default()
        }
    }
}

/// Issues one AI move and applies every store mutation for it. The caller
/// loops on `human_must_skip` after surfacing the skip notice, so a human
/// with no legal reply never has to click anything.
pub async fn drive_ai_round<E: EngineApi>(engine: &E, store: &mut StateStore) -> AiRound {
    let before = store.phase();
    store.begin_ai_move();

    match engine.ai_move().await {
        Ok(AiMoveOutcome::Moved(accepted)) => {
            let verification = accepted.verification;
            store.record_ai_move(accepted.mv);
            fetch_snapshot(engine, store).await;
            let legal = fetch_legal(engine, store).await;
            let game_over = store.snapshot().is_some_and(|s| s.is_over());
            store.complete_ai_move(verification.as_ref(), game_over);
            AiRound {
                follow_up: AiRoundFollowUp::Reveal {
                    human_must_skip: legal.should_skip_turn && !game_over,
                    game_over,
                },
                legal,
            }
        }
        Ok(AiMoveOutcome::SkipTurn {
            verification,
            message,
        }) => {
            store.ai_turn_skipped(verification.as_ref());
            fetch_snapshot(engine, store).await;
            let legal = fetch_legal(engine, store).await;
            AiRound {
                follow_up: AiRoundFollowUp::AiSkipped { message },
                legal,
            }
        }
        Ok(AiMoveOutcome::GameOver {
            verification,
            message,
            ..
        }) => {
            store.complete_ai_move(verification.as_ref(), true);
            fetch_snapshot(engine, store).await;
            AiRound {
                follow_up: AiRoundFollowUp::GameOver { message },
                legal: LegalUpdate::default(),
            }
        }
        Ok(AiMoveOutcome::Failed { message, .. }) => {
            store.restore_phase(before);
            AiRound {
                follow_up: AiRoundFollowUp::Failed { message },
                legal: LegalUpdate::default(),
            }
        }
        Err(err) => {
            store.restore_phase(before);
            AiRound {
                follow_up: AiRoundFollowUp::Failed {
                    message: err.to_string(),
                },
                legal: LegalUpdate::default(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HumanMoveFollowUp {
    /// Accepted; the caller walks the reveal frames.
    Reveal,
    /// Rejected by the rule engine; no state changed.
    Rejected,
    Failed { message: String },
}

/// Submits a human placement and applies the store mutations for an
/// accepted one.
pub async fn drive_human_move<E: EngineApi>(
    engine: &E,
    store: &mut StateStore,
    pos: Position,
) -> HumanMoveFollowUp {
    match engine.submit_move(pos).await {
        Ok(MoveOutcome::Accepted(accepted)) => {
            store.record_human_move(accepted.mv, accepted.verification);
            fetch_snapshot(engine, store).await;
            HumanMoveFollowUp::Reveal
        }
        Ok(MoveOutcome::Rejected { .. }) => HumanMoveFollowUp::Rejected,
        Err(err) => HumanMoveFollowUp::Failed {
            message: err.to_string(),
        },
    }
}
