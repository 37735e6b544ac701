//! The timed three-phase reveal of an accepted move. Phase order and pacing
//! are data, not nested callbacks: the driver walks the schedule and renders
//! one frame per entry, so ordering is a first-class, testable property.

use std::time::Duration;

use crate::types::Player;

/// Pause between placement and flip reveal.
pub const HUMAN_FLIP_DELAY: Duration = Duration::from_millis(600);
pub const AI_FLIP_DELAY: Duration = Duration::from_millis(1000);
/// Pause between flip reveal and the interactive frame. The AI gets a longer
/// window to sustain the thinking illusion.
pub const HUMAN_LEGAL_DELAY: Duration = Duration::from_millis(600);
pub const AI_LEGAL_DELAY: Duration = Duration::from_millis(1200);

/// Observation window before an announced skip hands the turn over.
pub const SKIP_NOTICE_DELAY: Duration = Duration::from_millis(500);
/// How long an advisor recommendation stays highlighted before auto-play.
pub const ADVISOR_PREVIEW_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// New disc visible, captures still in pre-flip color, no highlights.
    Placement,
    /// Flip cascade resolved, still no highlights or verification.
    Flip,
    /// Legal moves for the new side to move, verification merged, turn
    /// controller advanced, input re-enabled.
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealFrame {
    pub phase: RevealPhase,
    /// Timer suspension before this frame renders.
    pub delay_before: Duration,
    pub reveal_flip: bool,
    pub reveal_legal: bool,
    pub merge_verification: bool,
}

/// The fixed schedule for one accepted move. Placement renders synchronously
/// with the engine response; the captures must be visible before they flip,
/// and the flips must resolve before new legal targets appear.
pub fn reveal_schedule(mover: Player) -> [RevealFrame; 3] {
    let (flip_delay, legal_delay) = if mover.is_human() {
        (HUMAN_FLIP_DELAY, HUMAN_LEGAL_DELAY)
    } else {
        (AI_FLIP_DELAY, AI_LEGAL_DELAY)
    };
    [
        RevealFrame {
            phase: RevealPhase::Placement,
            delay_before: Duration::ZERO,
            reveal_flip: false,
            reveal_legal: false,
            merge_verification: false,
        },
        RevealFrame {
            phase: RevealPhase::Flip,
            delay_before: flip_delay,
            reveal_flip: true,
            reveal_legal: false,
            merge_verification: false,
        },
        RevealFrame {
            phase: RevealPhase::Interactive,
            delay_before: legal_delay,
            reveal_flip: true,
            reveal_legal: true,
            merge_verification: true,
        },
    ]
}
