//! Finite-state machine over the turn lifecycle. Button enablement and hint
//! text are both derived from [`TurnPhase`], never toggled independently.

/// Where the client is inside one human/AI round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Human to move, nothing pending.
    AwaitingHuman,
    /// Human moved; verify and AI-move are both open, advisor is not.
    HumanMovedUnverified,
    /// Human moved and verified; only AI-move remains.
    HumanMovedVerified,
    /// An AI move request is in flight.
    AiThinking,
    /// Terminal and absorbing until restart.
    GameOver,
}

/// The three action affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonSet {
    pub verify: bool,
    pub ai_move: bool,
    pub advisor: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Verify,
    AiMove,
    Advisor,
}

/// Pure affordance computation. Equal phases always yield equal buttons.
pub fn compute_buttons(phase: TurnPhase) -> ButtonSet {
    match phase {
        TurnPhase::AwaitingHuman => ButtonSet {
            verify: false,
            ai_move: false,
            advisor: true,
        },
        TurnPhase::HumanMovedUnverified => ButtonSet {
            verify: true,
            ai_move: true,
            advisor: false,
        },
        TurnPhase::HumanMovedVerified => ButtonSet {
            verify: false,
            ai_move: true,
            advisor: false,
        },
        TurnPhase::AiThinking | TurnPhase::GameOver => ButtonSet {
            verify: false,
            ai_move: false,
            advisor: false,
        },
    }
}

/// The button worth drawing attention to, if the phase leaves exactly one
/// sensible next action.
pub fn highlighted_button(phase: TurnPhase) -> Option<ButtonKind> {
    match phase {
        TurnPhase::HumanMovedVerified => Some(ButtonKind::AiMove),
        _ => None,
    }
}

pub const HINT_AWAITING_HUMAN: &str = "\
<p><strong>Your Turn</strong>: Please choose one of the following options:</p>\
<ul>\
<li>Click on a valid position (highlighted in dark) to place your disc.</li>\
<li>Click <strong>Suggest Move</strong> to get the advisor's analysis and suggested optimal move.</li>\
<li>Click <strong>Advisor Move</strong> to automatically play the advisor's optimal move.</li>\
</ul>";

pub const HINT_MOVED_UNVERIFIED: &str = "\
<p><strong>After Your Move</strong>: Please select one of the following options:</p>\
<ul>\
<li>Click <strong>Verify Move</strong> to verify whether your move satisfies the specifications.</li>\
<li>Click <strong>AI Move & Verify</strong> to let the AI make its move and verify it.</li>\
</ul>";

pub const HINT_MOVED_VERIFIED: &str = "\
<p><strong>AI's Turn</strong>: Click <strong>AI Move & Verify</strong> to let the AI make its move and verify it.</p>";

pub const HINT_AI_THINKING: &str = "<p><strong>AI's Turn</strong>: AI is thinking...</p>";

pub const HINT_GAME_OVER: &str =
    "<p><strong>Game Over!</strong> Click 'Restart' to play again.</p>";

pub const HINT_HUMAN_SKIPPED: &str = "\
<p><strong>AI's Turn</strong>: Your turn has been skipped as you have no valid moves. AI is thinking...</p>";

pub const HINT_AI_SKIPPED: &str = "\
<p><strong>Your Turn</strong>: AI has no valid moves. Your turn now.</p>";

/// Hint text for a phase. Derived from the same enum as the buttons so the
/// two cannot drift apart.
pub fn hint_for(phase: TurnPhase) -> &'static str {
    match phase {
        TurnPhase::AwaitingHuman => HINT_AWAITING_HUMAN,
        TurnPhase::HumanMovedUnverified => HINT_MOVED_UNVERIFIED,
        TurnPhase::HumanMovedVerified => HINT_MOVED_VERIFIED,
        TurnPhase::AiThinking => HINT_AI_THINKING,
        TurnPhase::GameOver => HINT_GAME_OVER,
    }
}

/// Owns the phase and enforces legal transitions. Unexpected events are
/// logged and ignored rather than corrupting the phase.
#[derive(Debug, Clone)]
pub struct TurnController {
    phase: TurnPhase,
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnController {
    pub fn new() -> Self {
        Self {
            phase: TurnPhase::AwaitingHuman,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn buttons(&self) -> ButtonSet {
        compute_buttons(self.phase)
    }

    pub fn hint(&self) -> &'static str {
        hint_for(self.phase)
    }

    /// Restores a phase reconstructed by the recovery procedure.
    pub fn restore(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    pub fn reset(&mut self) {
        self.phase = TurnPhase::AwaitingHuman;
    }

    /// Terminal entry, legal from any state the instant a winner is known.
    pub fn finish_game(&mut self) {
        self.phase = TurnPhase::GameOver;
    }

    pub fn on_human_moved(&mut self) {
        self.advance("human move", TurnPhase::HumanMovedUnverified, |phase| {
            phase == TurnPhase::AwaitingHuman
        });
    }

    pub fn on_verified(&mut self) {
        self.advance("verify", TurnPhase::HumanMovedVerified, |phase| {
            phase == TurnPhase::HumanMovedUnverified
        });
    }

    /// An AI move request went out. Also reachable straight from
    /// `AwaitingHuman` on a skipped human turn.
    pub fn on_ai_issued(&mut self) {
        self.advance("ai move issued", TurnPhase::AiThinking, |phase| {
            matches!(
                phase,
                TurnPhase::AwaitingHuman
                    | TurnPhase::HumanMovedUnverified
                    | TurnPhase::HumanMovedVerified
            )
        });
    }

    pub fn on_ai_finished(&mut self, game_over: bool) {
        let target = if game_over {
            TurnPhase::GameOver
        } else {
            TurnPhase::AwaitingHuman
        };
        self.advance("ai move finished", target, |phase| {
            phase == TurnPhase::AiThinking
        });
    }

    fn advance(
        &mut self,
        event: &str,
        target: TurnPhase,
        allowed: impl Fn(TurnPhase) -> bool,
    ) {
        if self.phase == TurnPhase::GameOver {
            log::warn!("{event} ignored: game is over");
            return;
        }
        if !allowed(self.phase) {
            log::warn!("{event} ignored in phase {:?}", self.phase);
            return;
        }
        self.phase = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_match_the_enablement_matrix() {
        let matrix = [
            (TurnPhase::AwaitingHuman, false, false, true),
            (TurnPhase::HumanMovedUnverified, true, true, false),
            (TurnPhase::HumanMovedVerified, false, true, false),
            (TurnPhase::AiThinking, false, false, false),
            (TurnPhase::GameOver, false, false, false),
        ];
        for (phase, verify, ai_move, advisor) in matrix {
            let buttons = compute_buttons(phase);
            assert_eq!(buttons.verify, verify, "{phase:?}");
            assert_eq!(buttons.ai_move, ai_move, "{phase:?}");
            assert_eq!(buttons.advisor, advisor, "{phase:?}");
        }
    }

    #[test]
    fn compute_buttons_is_pure() {
        for phase in [
            TurnPhase::AwaitingHuman,
            TurnPhase::HumanMovedUnverified,
            TurnPhase::HumanMovedVerified,
            TurnPhase::AiThinking,
            TurnPhase::GameOver,
        ] {
            assert_eq!(compute_buttons(phase), compute_buttons(phase));
            assert_eq!(hint_for(phase), hint_for(phase));
        }
    }

    #[test]
    fn happy_path_round_trip() {
        let mut turn = TurnController::new();
        turn.on_human_moved();
        assert_eq!(turn.phase(), TurnPhase::HumanMovedUnverified);

        turn.on_verified();
        assert_eq!(turn.phase(), TurnPhase::HumanMovedVerified);

        turn.on_ai_issued();
        assert_eq!(turn.phase(), TurnPhase::AiThinking);

        turn.on_ai_finished(false);
        assert_eq!(turn.phase(), TurnPhase::AwaitingHuman);
    }

    #[test]
    fn ai_move_is_allowed_without_verification() {
        let mut turn = TurnController::new();
        turn.on_human_moved();
        turn.on_ai_issued();
        assert_eq!(turn.phase(), TurnPhase::AiThinking);
    }

    #[test]
    fn skipped_human_turn_goes_straight_to_ai() {
        let mut turn = TurnController::new();
        turn.on_ai_issued();
        assert_eq!(turn.phase(), TurnPhase::AiThinking);
    }

    #[test]
    fn game_over_is_absorbing() {
        let mut turn = TurnController::new();
        turn.finish_game();

        turn.on_human_moved();
        turn.on_ai_issued();
        turn.on_ai_finished(false);
        assert_eq!(turn.phase(), TurnPhase::GameOver);

        turn.reset();
        assert_eq!(turn.phase(), TurnPhase::AwaitingHuman);
    }

    #[test]
    fn illegal_transitions_leave_phase_unchanged() {
        let mut turn = TurnController::new();
        turn.on_verified();
        assert_eq!(turn.phase(), TurnPhase::AwaitingHuman);

        turn.on_ai_finished(false);
        assert_eq!(turn.phase(), TurnPhase::AwaitingHuman);
    }

    #[test]
    fn hint_and_highlight_agree_with_phase() {
        assert_eq!(hint_for(TurnPhase::AiThinking), HINT_AI_THINKING);
        assert_eq!(
            highlighted_button(TurnPhase::HumanMovedVerified),
            Some(ButtonKind::AiMove)
        );
        assert_eq!(highlighted_button(TurnPhase::AwaitingHuman), None);
    }
}
