//! Browser entry point: wires the engine client, state store, renderer and
//! durable mirror together and drives the async move sequences.
//!
//! Every handler follows the same shape: take what it needs out of the
//! shared state, drop the borrow, await the engine, then re-borrow to apply
//! the result. No borrow is ever held across an await.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::advisor::{AdviceGate, AdviceTimer, advice_summary};
use crate::api::http::HttpEngine;
use crate::api::{AdviceOutcome, EngineApi};
use crate::persist::{LocalStorage, Mirror};
use crate::recovery::{VerificationEvidence, recover_phase, report_confirms_verification};
use crate::render::grid::{GridRenderer, Hud};
use crate::render::plan_cells;
use crate::round::{AiRoundFollowUp, HumanMoveFollowUp, drive_ai_round, drive_human_move};
use crate::sequencer::{ADVISOR_PREVIEW_DELAY, RevealPhase, SKIP_NOTICE_DELAY, reveal_schedule};
use crate::store::StateStore;
use crate::turn::{
    HINT_AI_SKIPPED, HINT_AI_THINKING, HINT_HUMAN_SKIPPED, TurnPhase, compute_buttons,
    highlighted_button, hint_for,
};
use crate::types::{Difficulty, Move, Player, Position};
use crate::verify::panel_lines;

struct Inner {
    engine: Rc<HttpEngine>,
    store: StateStore,
    mirror: Mirror<LocalStorage>,
    grid: GridRenderer,
    hud: Hud,
    gate: AdviceGate,
    /// Legal targets currently drawn, and the side they belong to.
    legal: Vec<Position>,
    legality_owner: Option<Player>,
    /// Set while a move sequence or engine round-trip owns the board;
    /// clicks and button handlers are ignored until it clears.
    busy: bool,
}

impl Inner {
    fn mirror_now(&mut self) {
        self.store.mirror_to(&mut self.mirror);
    }

    /// Repaints the board and counters for one reveal frame.
    fn render_frame(&self, reveal_flip: bool, show_legal: bool) {
        let Some(snapshot) = self.store.snapshot() else {
            return;
        };
        let legal: &[Position] = if show_legal { &self.legal } else { &[] };
        let cells = plan_cells(
            snapshot,
            self.store.last_move(),
            reveal_flip,
            legal,
            self.legality_owner,
        );
        self.grid.apply(&cells);
        self.hud.set_counts(snapshot.black_count, snapshot.white_count);
        self.hud.set_banner(&snapshot.banner());
        self.hud.set_progress(snapshot.rounds_played());
    }

    /// Derives buttons, highlight and hint from the current phase.
    fn render_controls(&self) {
        let phase = self.store.phase();
        self.hud.set_buttons(compute_buttons(phase));
        self.hud.highlight_button(highlighted_button(phase));
        self.hud.set_hint(hint_for(phase));
    }

    fn render_panel(&self) {
        self.hud.render_panel(&panel_lines(self.store.cache()));
    }

    /// Claims the busy flag. False means another sequence owns the board.
    fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }
}

fn with<R>(inner: &Rc<RefCell<Inner>>, f: impl FnOnce(&mut Inner) -> R) -> R {
    f(&mut inner.borrow_mut())
}

fn engine_of(inner: &Rc<RefCell<Inner>>) -> Rc<HttpEngine> {
    inner.borrow().engine.clone()
}

async fn sleep(duration: std::time::Duration) {
    TimeoutFuture::new(duration.as_millis() as u32).await;
}

/// Re-fetches the board and replaces the snapshot wholesale.
async fn refresh_snapshot(inner: &Rc<RefCell<Inner>>) -> bool {
    match engine_of(inner).snapshot().await {
        Ok(snapshot) => {
            with(inner, |i| i.store.apply_snapshot(snapshot));
            true
        }
        Err(err) => {
            log::error!("board poll failed: {err}");
            with(inner, |i| i.hud.alert(&format!("Failed to load the board: {err}")));
            false
        }
    }
}

/// Fetches legal moves for the side to move and installs the highlights.
/// Returns true when the side to move has no legal placement.
async fn refresh_legal(inner: &Rc<RefCell<Inner>>) -> bool {
    match engine_of(inner).legal_moves().await {
        Ok(legal) => with(inner, |i| {
            let owner = legal
                .to_move
                .or_else(|| i.store.snapshot().map(|s| s.current_player));
            i.legal = legal.positions;
            i.legality_owner = owner;
            legal.should_skip_turn
        }),
        Err(err) => {
            log::error!("legal-moves query failed: {err}");
            false
        }
    }
}

/// Walks the three reveal frames of an accepted move. The caller has already
/// recorded the move and refreshed the snapshot.
async fn run_reveal(inner: &Rc<RefCell<Inner>>, mover: Player) {
    for frame in reveal_schedule(mover) {
        if !frame.delay_before.is_zero() {
            sleep(frame.delay_before).await;
        }
        with(inner, |i| i.render_frame(frame.reveal_flip, frame.reveal_legal));
        if frame.phase == RevealPhase::Interactive {
            with(inner, |i| {
                i.render_controls();
                i.hud.render_move_log(i.store.move_log());
                if !i.store.cache().is_empty() {
                    i.render_panel();
                }
                i.mirror_now();
            });
        }
    }
}

/// Submits a human placement and, if accepted, plays the reveal sequence.
/// The caller owns the busy flag; it is released here.
async fn play_human_move(inner: Rc<RefCell<Inner>>, pos: Position) {
    let engine = engine_of(&inner);
    // The store leaves the cell for the engine round; busy blocks reentry.
    let mut store = with(&inner, |i| {
        i.gate.invalidate();
        std::mem::take(&mut i.store)
    });
    let follow_up = drive_human_move(engine.as_ref(), &mut store, pos).await;
    with(&inner, |i| i.store = store);

    match follow_up {
        HumanMoveFollowUp::Reveal => {
            with(&inner, |i| {
                i.legal.clear();
                i.legality_owner = None;
                i.grid.clear_legal_highlights();
                i.grid.set_advisor_highlight(None);
            });
            run_reveal(&inner, Player::Black).await;
        }
        HumanMoveFollowUp::Rejected => {
            with(&inner, |i| {
                i.hud
                    .alert("Invalid move. Please choose one of the highlighted positions.");
            });
        }
        HumanMoveFollowUp::Failed { message } => {
            with(&inner, |i| i.hud.alert(&format!("Move failed: {message}")));
        }
    }
    with(&inner, |i| i.busy = false);
}

async fn handle_cell_click(inner: Rc<RefCell<Inner>>, pos: Position) {
    let ready = with(&inner, |i| {
        i.store.phase() == TurnPhase::AwaitingHuman && i.try_begin()
    });
    if !ready {
        return;
    }
    play_human_move(inner, pos).await;
}

/// Issues one AI move and plays its reveal. Loops while the human keeps
/// having no legal reply, announcing each skipped turn in between.
async fn run_ai_move(inner: Rc<RefCell<Inner>>, mut human_was_skipped: bool) {
    let engine = engine_of(&inner);
    let mut ai_skipped_message = None;
    loop {
        with(&inner, |i| {
            i.legal.clear();
            i.legality_owner = None;
            i.grid.clear_legal_highlights();
            i.hud.set_buttons(compute_buttons(TurnPhase::AiThinking));
            i.hud.highlight_button(None);
            i.hud.set_hint(if human_was_skipped {
                HINT_HUMAN_SKIPPED
            } else {
                HINT_AI_THINKING
            });
        });

        // The store leaves the cell for the engine round; busy blocks
        // reentry while it is out.
        let mut store = with(&inner, |i| std::mem::take(&mut i.store));
        let round = drive_ai_round(engine.as_ref(), &mut store).await;
        with(&inner, |i| {
            i.store = store;
            i.legal = round.legal.positions;
            i.legality_owner = round.legal.owner;
            i.mirror_now();
        });

        match round.follow_up {
            AiRoundFollowUp::Reveal {
                human_must_skip,
                game_over,
            } => {
                run_reveal(&inner, Player::White).await;
                if game_over {
                    break;
                }
                if human_must_skip {
                    with(&inner, |i| {
                        i.hud.set_hint(HINT_HUMAN_SKIPPED);
                        i.hud
                            .alert("You have no valid moves. Your turn will be skipped.");
                    });
                    sleep(SKIP_NOTICE_DELAY).await;
                    human_was_skipped = true;
                    continue;
                }
                break;
            }
            AiRoundFollowUp::AiSkipped { message } => {
                ai_skipped_message = Some(message);
                break;
            }
            AiRoundFollowUp::GameOver { message } => {
                with(&inner, |i| {
                    if !message.is_empty() {
                        i.hud.alert(&message);
                    }
                });
                break;
            }
            AiRoundFollowUp::Failed { message } => {
                with(&inner, |i| i.hud.alert(&format!("AI move failed: {message}")));
                break;
            }
        }
    }

    with(&inner, |i| {
        i.render_frame(true, true);
        i.render_controls();
        i.hud.render_move_log(i.store.move_log());
        if !i.store.cache().is_empty() {
            i.render_panel();
        }
        if ai_skipped_message.is_some() {
            i.hud.set_hint(HINT_AI_SKIPPED);
        }
        i.mirror_now();
        i.busy = false;
    });
    if let Some(message) = ai_skipped_message {
        if !message.is_empty() {
            with(&inner, |i| i.hud.alert(&message));
        }
    }
}

async fn handle_ai_move_click(inner: Rc<RefCell<Inner>>) {
    let ready = with(&inner, |i| {
        matches!(
            i.store.phase(),
            TurnPhase::HumanMovedUnverified | TurnPhase::HumanMovedVerified
        ) && i.try_begin()
    });
    if !ready {
        return;
    }
    run_ai_move(inner, false).await;
}

/// The verify action. Shows the held per-move report when one exists,
/// otherwise asks the verifier for a full pass over all six properties.
async fn handle_verify_click(inner: Rc<RefCell<Inner>>) {
    let ready = with(&inner, |i| {
        i.store.phase() == TurnPhase::HumanMovedUnverified && i.try_begin()
    });
    if !ready {
        return;
    }

    let shown = with(&inner, |i| i.store.mark_human_verified());
    if !shown {
        match engine_of(&inner).verification().await {
            Ok(report) => with(&inner, |i| i.store.merge_full_verification(&report)),
            Err(err) => {
                with(&inner, |i| {
                    i.hud.alert(&format!("Verification failed: {err}"));
                    i.busy = false;
                });
                return;
            }
        }
    }

    with(&inner, |i| {
        i.render_panel();
        i.render_controls();
        i.mirror_now();
        i.busy = false;
    });
}

/// Opens the advisor panel with an analysis of the current position. Does
/// not lock the board; a stale response is dropped at the gate.
async fn handle_suggest_click(inner: Rc<RefCell<Inner>>) {
    let token = with(&inner, |i| {
        if i.store.phase() != TurnPhase::AwaitingHuman || i.busy {
            return None;
        }
        i.hud
            .show_advisor_panel("<p>Analyzing board position...</p>");
        Some(i.gate.issue())
    });
    let Some(token) = token else {
        return;
    };

    let timer = AdviceTimer::start();
    let outcome = engine_of(&inner).advice().await;
    let elapsed = timer.elapsed_ms();

    with(&inner, |i| {
        if !i.gate.is_current(token) {
            log::debug!("dropping stale advisor response");
            return;
        }
        if !i.hud.advisor_panel_open() {
            return;
        }
        match outcome {
            Ok(AdviceOutcome::Move(advice)) => {
                i.grid.set_advisor_highlight(Some(advice.position));
                i.hud.show_advisor_panel(&advice_summary(&advice, elapsed));
            }
            Ok(AdviceOutcome::NoMove { message }) => {
                i.hud.show_advisor_panel(&format!("<p>{message}</p>"));
            }
            Err(err) => {
                i.hud
                    .show_advisor_panel(&format!("<p>Advisor unavailable: {err}</p>"));
            }
        }
    });
}

/// Fetches the advisor's best move, previews it briefly, then plays it.
async fn handle_advisor_move_click(inner: Rc<RefCell<Inner>>) {
    let ready = with(&inner, |i| {
        i.store.phase() == TurnPhase::AwaitingHuman && i.try_begin()
    });
    if !ready {
        return;
    }

    match engine_of(&inner).advice().await {
        Ok(AdviceOutcome::Move(advice)) => {
            with(&inner, |i| {
                i.grid.set_advisor_highlight(Some(advice.position));
            });
            sleep(ADVISOR_PREVIEW_DELAY).await;
            play_human_move(inner, advice.position).await;
        }
        Ok(AdviceOutcome::NoMove { message }) => {
            with(&inner, |i| {
                i.hud.alert(&message);
                i.busy = false;
            });
        }
        Err(err) => {
            with(&inner, |i| {
                i.hud.alert(&format!("Advisor unavailable: {err}"));
                i.busy = false;
            });
        }
    }
}

fn close_advisor(inner: &Rc<RefCell<Inner>>) {
    with(inner, |i| {
        i.gate.invalidate();
        i.hud.hide_advisor_panel();
        i.grid.set_advisor_highlight(None);
    });
}

/// Local state wipe shared by restart and forced difficulty restarts.
fn reset_local_state(i: &mut Inner) {
    i.store.reset();
    i.mirror.clear_all();
    i.gate.invalidate();
    i.legal.clear();
    i.legality_owner = None;
    i.hud.hide_panel();
    i.hud.hide_advisor_panel();
    i.hud.set_hint_hidden(false);
    i.grid.set_advisor_highlight(None);
}

/// Brings a fresh game onto the screen after the engine reset.
async fn load_fresh_game(inner: &Rc<RefCell<Inner>>) {
    if !refresh_snapshot(inner).await {
        return;
    }
    refresh_legal(inner).await;
    with(inner, |i| {
        i.render_frame(true, true);
        i.render_controls();
        i.hud.render_move_log(i.store.move_log());
        i.mirror_now();
    });
}

async fn handle_restart_click(inner: Rc<RefCell<Inner>>) {
    if !with(&inner, Inner::try_begin) {
        return;
    }
    match engine_of(&inner).restart().await {
        Ok(()) => {
            with(&inner, reset_local_state);
            load_fresh_game(&inner).await;
        }
        Err(err) => {
            with(&inner, |i| i.hud.alert(&format!("Restart failed: {err}")));
        }
    }
    with(&inner, |i| i.busy = false);
}

async fn apply_difficulty(inner: Rc<RefCell<Inner>>, difficulty: Difficulty) {
    let decision = with(&inner, |i| {
        if !i.try_begin() {
            return None;
        }
        if i.store.difficulty() == difficulty {
            i.busy = false;
            return None;
        }
        let in_progress = i
            .store
            .snapshot()
            .is_some_and(|s| s.rounds_played() > 0 && !s.is_over());
        if in_progress
            && !i
                .hud
                .confirm("Changing difficulty will restart the game. Continue?")
        {
            i.busy = false;
            return None;
        }
        Some(in_progress)
    });
    let Some(restart_needed) = decision else {
        return;
    };

    match engine_of(&inner)
        .set_difficulty(difficulty, restart_needed)
        .await
    {
        Ok(()) => {
            with(&inner, |i| {
                i.store.set_difficulty(difficulty);
                if restart_needed {
                    // reset_local_state keeps the difficulty preference.
                    reset_local_state(i);
                }
            });
            if restart_needed {
                load_fresh_game(&inner).await;
            } else {
                with(&inner, Inner::mirror_now);
            }
        }
        Err(err) => {
            with(&inner, |i| {
                i.hud.alert(&format!("Failed to change difficulty: {err}"))
            });
        }
    }
    with(&inner, |i| i.busy = false);
}

/// First load: fetch the board, rebuild the phase from the mirror plus the
/// engine's last-move metadata, and repaint everything.
async fn boot(inner: Rc<RefCell<Inner>>) {
    if !refresh_snapshot(&inner).await {
        return;
    }

    let last_move = match engine_of(&inner).last_move_info().await {
        Ok(info) => info.last_move.map(|position| Move {
            position,
            flipped: info.flipped,
            mover: info.last_mover.unwrap_or(Player::Black),
        }),
        Err(err) => {
            log::warn!("last-move query failed, continuing without it: {err}");
            None
        }
    };

    // Fresh verifier pass: evidence independent of the durable mirror.
    let fresh_report = match engine_of(&inner).verification().await {
        Ok(report) => Some(report),
        Err(err) => {
            log::warn!("verification query failed, continuing without it: {err}");
            None
        }
    };

    let should_skip = with(&inner, |i| {
        let mut cache = i.mirror.load_cache().unwrap_or_default();
        let report_text = fresh_report
            .as_ref()
            .is_some_and(report_confirms_verification);
        if report_text {
            if let Some(report) = fresh_report.as_ref() {
                cache.merge(report, Some(Player::Black));
            }
        }
        let evidence = VerificationEvidence {
            durable_flag: i.mirror.verification_completed(),
            report_text,
            panel_content: i.hud.panel_has_content(),
        };
        let snapshot = i.store.snapshot().cloned();
        let phase = snapshot
            .as_ref()
            .map(|s| recover_phase(s, evidence))
            .unwrap_or(TurnPhase::AwaitingHuman);

        let verified = evidence.any() && !cache.is_empty();
        i.store.restore(
            phase,
            cache,
            i.mirror.load_move_log(),
            evidence.durable_flag,
            last_move,
        );
        i.store.set_difficulty(i.mirror.load_difficulty());
        i.hud.set_hint_hidden(i.mirror.hint_hidden());
        if verified {
            i.render_panel();
        }
        phase
    }) == TurnPhase::AwaitingHuman
        // Legality queries are idempotent: skip when highlights survive.
        && !with(&inner, |i| i.grid.has_legal_highlights())
        && refresh_legal(&inner).await;

    with(&inner, |i| {
        i.render_frame(true, true);
        i.render_controls();
        i.hud.render_move_log(i.store.move_log());
        i.mirror_now();
    });

    if should_skip {
        let proceed = with(&inner, |i| {
            if !i.try_begin() {
                return false;
            }
            i.hud.set_hint(HINT_HUMAN_SKIPPED);
            i.hud
                .alert("You have no valid moves. Your turn will be skipped.");
            true
        });
        if proceed {
            sleep(SKIP_NOTICE_DELAY).await;
            run_ai_move(inner, true).await;
        }
    }
}

/// Handle exported to the page. Construction mounts the grid; `start`
/// kicks off recovery.
#[wasm_bindgen]
pub struct App {
    inner: Rc<RefCell<Inner>>,
}

#[wasm_bindgen]
impl App {
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: &str) -> Result<App, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let hud = Hud::mount(&document).map_err(|e| JsValue::from_str(&e))?;

        // The grid's click closures outlive this constructor, so they go
        // through a slot that is filled in once the shared state exists.
        let slot: Rc<RefCell<Option<Rc<dyn Fn(Position)>>>> = Rc::new(RefCell::new(None));
        let cell_slot = slot.clone();
        let grid = GridRenderer::mount(
            &document,
            Rc::new(move |pos| {
                let handler = cell_slot.borrow().clone();
                if let Some(handler) = handler {
                    handler(pos);
                }
            }),
        )
        .map_err(|e| JsValue::from_str(&e))?;

        let inner = Rc::new(RefCell::new(Inner {
            engine: Rc::new(HttpEngine::new(base_url)),
            store: StateStore::new(),
            mirror: Mirror::new(LocalStorage::open()),
            grid,
            hud,
            gate: AdviceGate::default(),
            legal: Vec::new(),
            legality_owner: None,
            busy: false,
        }));

        let for_clicks = inner.clone();
        *slot.borrow_mut() = Some(Rc::new(move |pos| {
            spawn_local(handle_cell_click(for_clicks.clone(), pos));
        }));

        Ok(App { inner })
    }

    pub fn start(&self) {
        spawn_local(boot(self.inner.clone()));
    }

    pub fn verify_move(&self) {
        spawn_local(handle_verify_click(self.inner.clone()));
    }

    pub fn ai_move(&self) {
        spawn_local(handle_ai_move_click(self.inner.clone()));
    }

    pub fn suggest_move(&self) {
        spawn_local(handle_suggest_click(self.inner.clone()));
    }

    pub fn advisor_move(&self) {
        spawn_local(handle_advisor_move_click(self.inner.clone()));
    }

    pub fn close_advisor(&self) {
        close_advisor(&self.inner);
    }

    pub fn restart(&self) {
        spawn_local(handle_restart_click(self.inner.clone()));
    }

    pub fn set_difficulty(&self, level: &str) {
        let Some(difficulty) = Difficulty::from_name(level) else {
            log::warn!("unknown difficulty {level:?}");
            return;
        };
        spawn_local(apply_difficulty(self.inner.clone(), difficulty));
    }

    pub fn difficulty(&self) -> String {
        self.inner.borrow().store.difficulty().as_str().to_string()
    }

    pub fn toggle_hint(&self) {
        with(&self.inner, |i| {
            let hidden = !i.mirror.hint_hidden();
            i.mirror.set_hint_hidden(hidden);
            i.hud.set_hint_hidden(hidden);
        });
    }
}
