//! Browser-side smoke tests, run with `wasm-pack test --headless`.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

use reversi_client::persist::{Mirror, MemoryStore, decode_blob, encode_blob};
use reversi_client::recovery::{VerificationEvidence, recover_phase};
use reversi_client::turn::TurnPhase;
use reversi_client::types::{BoardGrid, GameSnapshot, MoveLogEntry, Player, Position};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn module_loads() {
    assert!(reversi_client::wasm_ready());
}

#[wasm_bindgen_test]
fn blobs_round_trip_in_the_browser() {
    let log = vec![MoveLogEntry {
        human: Some(Position::new(2, 3)),
        ai: Some(Position::new(2, 2)),
    }];
    let blob = encode_blob(&log).unwrap();
    let back: Vec<MoveLogEntry> = decode_blob(&blob).unwrap();
    assert_eq!(back, log);
}

#[wasm_bindgen_test]
fn reload_mid_turn_recovers_the_unverified_phase() {
    let snapshot = GameSnapshot {
        board: BoardGrid::empty(),
        current_player: Player::White,
        black_count: 3,
        white_count: 2,
        winner: None,
    };
    let phase = recover_phase(&snapshot, VerificationEvidence::default());
    assert_eq!(phase, TurnPhase::HumanMovedUnverified);

    let mut mirror = Mirror::new(MemoryStore::default());
    mirror.set_verification_completed(true);
    let phase = recover_phase(
        &snapshot,
        VerificationEvidence {
            durable_flag: mirror.verification_completed(),
            ..Default::default()
        },
    );
    assert_eq!(phase, TurnPhase::HumanMovedVerified);
}
