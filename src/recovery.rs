//! Rebuilds the turn phase after a full page reload from the engine's
//! current snapshot plus whatever evidence of a completed verification
//! survived.

use crate::turn::TurnPhase;
use crate::types::GameSnapshot;
use crate::verify::{PropertyKey, VerificationReport};

/// Three independent signals that the human's last move was verified,
/// combined with OR semantics: any one of them is sufficient evidence,
/// because no single signal reliably survives an arbitrary reload.
///
/// `durable_flag` comes from the local mirror, `report_text` from a fresh
/// boot-time verifier query, `panel_content` from the live document, so no
/// two of them share a failure mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationEvidence {
    pub durable_flag: bool,
    pub report_text: bool,
    pub panel_content: bool,
}

impl VerificationEvidence {
    pub fn any(self) -> bool {
        self.durable_flag || self.report_text || self.panel_content
    }
}

/// The verifier phrases an already-checked human move as "move verified"
/// in its legal-moves details, so a fresh report with that wording proves
/// the verify action ran before the reload.
pub fn report_confirms_verification(report: &VerificationReport) -> bool {
    report
        .get(PropertyKey::LegalMovesBlack)
        .is_some_and(|result| result.details.to_lowercase().contains("move verified"))
}

/// Pure phase reconstruction.
pub fn recover_phase(snapshot: &GameSnapshot, evidence: VerificationEvidence) -> TurnPhase {
    if snapshot.is_over() {
        return TurnPhase::GameOver;
    }

    // AI to move means the human's placement is the pending one. The reload
    // killed any in-flight AI request, so AiThinking is never reconstructed;
    // the user re-issues the AI move instead. Note a skipped AI turn leaves
    // the human both the last mover and the side to move, so the side to
    // move is the deciding signal, not the last mover.
    if !snapshot.current_player.is_human() {
        return if evidence.any() {
            TurnPhase::HumanMovedVerified
        } else {
            TurnPhase::HumanMovedUnverified
        };
    }

    TurnPhase::AwaitingHuman
}
