//! Single source of truth for rendering decisions. Mutated only by the move
//! sequencer and the recovery procedure; render code reads, never writes.

use crate::persist::{KvStore, Mirror};
use crate::turn::{TurnController, TurnPhase};
use crate::types::{Difficulty, GameSnapshot, Move, MoveLogEntry, Player};
use crate::verify::{VerificationCache, VerificationReport};

#[derive(Debug, Default)]
pub struct StateStore {
    snapshot: Option<GameSnapshot>,
    turn: TurnController,
    cache: VerificationCache,
    move_log: Vec<MoveLogEntry>,
    /// The human clicked verify for their latest move (durable across
    /// reloads through the mirror).
    verification_completed: bool,
    /// Partial report returned with the human's accepted move, held until
    /// the verify action displays it.
    pending_human_report: Option<VerificationReport>,
    last_move: Option<Move>,
    difficulty: Difficulty,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn phase(&self) -> TurnPhase {
        self.turn.phase()
    }

    pub fn turn(&self) -> &TurnController {
        &self.turn
    }

    pub fn cache(&self) -> &VerificationCache {
        &self.cache
    }

    pub fn move_log(&self) -> &[MoveLogEntry] {
        &self.move_log
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    pub fn verification_completed(&self) -> bool {
        self.verification_completed
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Replaces the board state wholesale. A reported winner forces the
    /// terminal phase regardless of what the turn controller thought.
    pub fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        if snapshot.is_over() {
            self.turn.finish_game();
        }
        self.snapshot = Some(snapshot);
    }

    /// An accepted human placement. The partial report rides along but is
    /// not merged until the verify action shows it.
    pub fn record_human_move(&mut self, mv: Move, verification: Option<VerificationReport>) {
        self.move_log.push(MoveLogEntry {
            human: Some(mv.position),
            ai: None,
        });
        self.pending_human_report = verification;
        self.last_move = Some(mv);
        self.turn.on_human_moved();
    }

    /// The verify action: merge the pending report (scoped to the human) and
    /// latch the durable flag. Returns false when there is nothing to show
    /// and the caller should fall back to a manual full verification.
    pub fn mark_human_verified(&mut self) -> bool {
        let Some(report) = self.pending_human_report.take() else {
            return false;
        };
        self.cache.merge(&report, Some(Player::Black));
        self.verification_completed = true;
        self.turn.on_verified();
        true
    }

    /// Manual full verification: every key is current, unscoped merge.
    pub fn merge_full_verification(&mut self, report: &VerificationReport) {
        self.cache.merge(report, None);
        self.verification_completed = true;
        if self.turn.phase() == TurnPhase::HumanMovedUnverified {
            self.turn.on_verified();
        }
    }

    /// An AI move request went out. The cache is cleared here so a stale
    /// human-verified flag cannot leak into the next human turn; the AI's
    /// own partial report repopulates it at the interactive frame.
    pub fn begin_ai_move(&mut self) {
        self.cache.clear();
        self.verification_completed = false;
        self.pending_human_report = None;
        self.turn.on_ai_issued();
    }

    pub fn record_ai_move(&mut self, mv: Move) {
        match self.move_log.last_mut() {
            Some(entry) if entry.ai.is_none() => entry.ai = Some(mv.position),
            _ => self.move_log.push(MoveLogEntry {
                human: None,
                ai: Some(mv.position),
            }),
        }
        self.last_move = Some(mv);
    }

    /// The interactive frame of an AI move: merge its report scoped to the
    /// AI and hand the turn back (or end the game).
    pub fn complete_ai_move(&mut self, verification: Option<&VerificationReport>, game_over: bool) {
        if let Some(report) = verification {
            self.cache.merge(report, Some(Player::White));
        }
        // The snapshot may already have latched the terminal phase.
        if game_over {
            self.turn.finish_game();
        } else {
            self.turn.on_ai_finished(false);
        }
    }

    /// A skipped AI turn: no placement, but its verification still lands.
    pub fn ai_turn_skipped(&mut self, verification: Option<&VerificationReport>) {
        if let Some(report) = verification {
            self.cache.merge(report, Some(Player::White));
        }
        self.turn.on_ai_finished(false);
    }

    pub fn finish_game(&mut self) {
        self.turn.finish_game();
    }

    /// Restores recovered state after a reload.
    pub fn restore(
        &mut self,
        phase: TurnPhase,
        cache: VerificationCache,
        move_log: Vec<MoveLogEntry>,
        verification_completed: bool,
        last_move: Option<Move>,
    ) {
        self.turn.restore(phase);
        self.cache = cache;
        self.move_log = move_log;
        self.verification_completed = verification_completed;
        self.last_move = last_move;
    }

    /// Puts the turn controller back into a known-good phase after a failed
    /// engine call, without touching any other state.
    pub fn restore_phase(&mut self, phase: TurnPhase) {
        self.turn.restore(phase);
    }

    /// Full reset on restart. Difficulty is a user preference and survives.
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.turn.reset();
        self.cache.clear();
        self.move_log.clear();
        self.verification_completed = false;
        self.pending_human_report = None;
        self.last_move = None;
    }

    /// Writes the durable mirror. Callers mutate this store first and call
    /// this second, so a crash mid-write never leaves the mirror ahead of
    /// memory.
    pub fn mirror_to<S: KvStore>(&self, mirror: &mut Mirror<S>) {
        mirror.save_cache(&self.cache);
        mirror.set_verification_completed(self.verification_completed);
        mirror.save_move_log(&self.move_log);
        mirror.save_difficulty(self.difficulty);
    }
}
