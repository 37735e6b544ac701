//! DOM reconciliation. The grid is constructed exactly once per page; every
//! later frame locates the existing cells and mutates contents and classes
//! in place, which keeps CSS transition state alive across frames.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, Element};

use crate::render::plan::CellPatch;
use crate::turn::{ButtonKind, ButtonSet};
use crate::types::{BOARD_SIZE, MoveLogEntry, Position, TOTAL_ROUNDS};
use crate::verify::{PanelLine, PropertyStatus};

pub mod ids {
    pub const BOARD: &str = "board";
    pub const BLACK_COUNT: &str = "black-count";
    pub const WHITE_COUNT: &str = "white-count";
    pub const TURN_INDICATOR: &str = "turn-indicator";
    pub const GAME_HINT: &str = "game-hint";
    pub const VERIFY_BUTTON: &str = "verify-button";
    pub const AI_MOVE_BUTTON: &str = "ai-move-button";
    pub const ADVISOR_BUTTON: &str = "advisor-button";
    pub const VERIFICATION_RESULTS: &str = "verification-results";
    pub const ADVISOR_PANEL: &str = "advisor-panel";
    pub const ADVISOR_CONTENT: &str = "advisor-content";
    pub const PROGRESS_TEXT: &str = "progress-text";
    pub const PROGRESS_BAR: &str = "progress-bar";
    pub const MOVE_LOG_BODY: &str = "move-log-body";
}

fn element(document: &Document, id: &str) -> Result<Element, String> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| format!("missing #{id} element"))
}

fn status_class(status: PropertyStatus) -> &'static str {
    match status {
        PropertyStatus::Pass => "verification-pass",
        PropertyStatus::Fail => "verification-fail",
        PropertyStatus::Pending => "verification-pending",
    }
}

/// The board grid and the cell element handles captured at construction.
pub struct GridRenderer {
    document: Document,
    cells: Vec<Element>,
    // Keeps the per-cell click closures alive for the page lifetime.
    _listeners: Vec<Closure<dyn FnMut()>>,
}

impl GridRenderer {
    /// Builds the coordinate-labeled grid under `#board`. Call once.
    pub fn mount(
        document: &Document,
        on_click: Rc<dyn Fn(Position)>,
    ) -> Result<Self, String> {
        let board = element(document, ids::BOARD)?;
        board.set_inner_html("");

        let make_div = |class: &str| -> Result<Element, String> {
            let div = document
                .create_element("div")
                .map_err(|_| "createElement failed".to_string())?;
            div.set_class_name(class);
            Ok(div)
        };

        let top_row = make_div("coordinate-row")?;
        top_row.append_child(&make_div("coordinate-cell corner")?).ok();
        for col in 0..BOARD_SIZE {
            let header = make_div("coordinate-cell")?;
            header.set_text_content(Some(&(col + 1).to_string()));
            top_row.append_child(&header).ok();
        }
        board.append_child(&top_row).ok();

        let mut cells = Vec::with_capacity(BOARD_SIZE * BOARD_SIZE);
        let mut listeners = Vec::with_capacity(BOARD_SIZE * BOARD_SIZE);
        for row in 0..BOARD_SIZE {
            let board_row = make_div("board-row")?;
            let header = make_div("coordinate-cell")?;
            header.set_text_content(Some(&(row + 1).to_string()));
            board_row.append_child(&header).ok();

            for col in 0..BOARD_SIZE {
                let cell = make_div("cell")?;
                let pos = Position::new(row as u8, col as u8);
                let handler = on_click.clone();
                let closure = Closure::<dyn FnMut()>::new(move || handler(pos));
                cell.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                    .map_err(|_| "addEventListener failed".to_string())?;
                listeners.push(closure);
                board_row.append_child(&cell).ok();
                cells.push(cell);
            }
            board.append_child(&board_row).ok();
        }

        Ok(Self {
            document: document.clone(),
            cells,
            _listeners: listeners,
        })
    }

    fn cell(&self, pos: Position) -> &Element {
        &self.cells[pos.row as usize * BOARD_SIZE + pos.col as usize]
    }

    /// Applies one planned frame. Only cell contents and classes change.
    pub fn apply(&self, patches: &[[CellPatch; BOARD_SIZE]; BOARD_SIZE]) {
        for (row, row_patches) in patches.iter().enumerate() {
            for (col, patch) in row_patches.iter().enumerate() {
                let cell = self.cell(Position::new(row as u8, col as u8));
                let keep_advisor = cell.class_list().contains("advisor-recommended");

                let mut cell_class = String::from("cell");
                if patch.legal {
                    cell_class.push_str(" valid-move");
                }
                if keep_advisor {
                    cell_class.push_str(" advisor-recommended");
                }
                cell.set_class_name(&cell_class);

                cell.set_inner_html("");
                if let Some(player) = patch.disc {
                    if let Ok(disc) = self.document.create_element("div") {
                        let mut class = String::from(if player.is_human() {
                            "black"
                        } else {
                            "white"
                        });
                        if patch.just_placed {
                            class.push_str(" last-move");
                        }
                        if patch.flip_marker {
                            class.push_str(" highlight");
                        }
                        if patch.flip_animating {
                            class.push_str(" flipping");
                        }
                        disc.set_class_name(&class);
                        cell.append_child(&disc).ok();
                    }
                }
            }
        }
    }

    /// True when any cell already carries a legal-move highlight. Used to
    /// keep the legality query idempotent.
    pub fn has_legal_highlights(&self) -> bool {
        self.cells
            .iter()
            .any(|cell| cell.class_list().contains("valid-move"))
    }

    pub fn clear_legal_highlights(&self) {
        for cell in &self.cells {
            cell.class_list().remove_1("valid-move").ok();
        }
    }

    pub fn set_advisor_highlight(&self, pos: Option<Position>) {
        for cell in &self.cells {
            cell.class_list().remove_1("advisor-recommended").ok();
        }
        if let Some(pos) = pos {
            self.cell(pos).class_list().add_1("advisor-recommended").ok();
        }
    }
}

/// Everything around the board: counters, banner, hint, buttons, panels.
pub struct Hud {
    black_count: Element,
    white_count: Element,
    turn_indicator: Element,
    game_hint: Element,
    verify_button: Element,
    ai_move_button: Element,
    advisor_button: Element,
    verification_results: Element,
    advisor_panel: Element,
    advisor_content: Element,
    progress_text: Element,
    progress_bar: Element,
    move_log_body: Element,
    document: Document,
}

impl Hud {
    pub fn mount(document: &Document) -> Result<Self, String> {
        Ok(Self {
            black_count: element(document, ids::BLACK_COUNT)?,
            white_count: element(document, ids::WHITE_COUNT)?,
            turn_indicator: element(document, ids::TURN_INDICATOR)?,
            game_hint: element(document, ids::GAME_HINT)?,
            verify_button: element(document, ids::VERIFY_BUTTON)?,
            ai_move_button: element(document, ids::AI_MOVE_BUTTON)?,
            advisor_button: element(document, ids::ADVISOR_BUTTON)?,
            verification_results: element(document, ids::VERIFICATION_RESULTS)?,
            advisor_panel: element(document, ids::ADVISOR_PANEL)?,
            advisor_content: element(document, ids::ADVISOR_CONTENT)?,
            progress_text: element(document, ids::PROGRESS_TEXT)?,
            progress_bar: element(document, ids::PROGRESS_BAR)?,
            move_log_body: element(document, ids::MOVE_LOG_BODY)?,
            document: document.clone(),
        })
    }

    pub fn set_counts(&self, black: u8, white: u8) {
        self.black_count.set_text_content(Some(&black.to_string()));
        self.white_count.set_text_content(Some(&white.to_string()));
    }

    pub fn set_banner(&self, text: &str) {
        self.turn_indicator.set_text_content(Some(text));
    }

    pub fn set_hint(&self, html: &str) {
        self.game_hint.set_inner_html(html);
    }

    pub fn set_hint_hidden(&self, hidden: bool) {
        let list = self.game_hint.class_list();
        if hidden {
            list.add_1("hidden").ok();
        } else {
            list.remove_1("hidden").ok();
        }
    }

    pub fn set_progress(&self, rounds_played: u8) {
        let percent = (rounds_played as u32 * 100) / TOTAL_ROUNDS as u32;
        self.progress_text.set_text_content(Some(&format!(
            "Progressed: {rounds_played}/{TOTAL_ROUNDS}"
        )));
        self.progress_bar
            .set_attribute("style", &format!("width: {percent}%"))
            .ok();
    }

    pub fn set_buttons(&self, buttons: ButtonSet) {
        set_enabled(&self.verify_button, buttons.verify);
        set_enabled(&self.ai_move_button, buttons.ai_move);
        set_enabled(&self.advisor_button, buttons.advisor);
    }

    pub fn highlight_button(&self, kind: Option<ButtonKind>) {
        for button in [
            &self.verify_button,
            &self.ai_move_button,
            &self.advisor_button,
        ] {
            button.class_list().remove_1("active").ok();
        }
        let target = match kind {
            Some(ButtonKind::Verify) => &self.verify_button,
            Some(ButtonKind::AiMove) => &self.ai_move_button,
            Some(ButtonKind::Advisor) => &self.advisor_button,
            None => return,
        };
        target.class_list().add_1("active").ok();
    }

    /// Rebuilds the verification panel from planned lines and reveals it.
    pub fn render_panel(&self, lines: &[PanelLine]) {
        self.verification_results.set_inner_html("");
        for line in lines {
            let Ok(item) = self.document.create_element("div") else {
                continue;
            };
            let mut class = String::from("verification-item");
            if let Some(status) = line.status {
                class.push(' ');
                class.push_str(status_class(status));
            }
            if line.indented {
                class.push_str(" indented");
            }
            item.set_class_name(&class);

            if let Ok(label) = self.document.create_element("strong") {
                label.set_text_content(Some(&format!("{}:", line.label)));
                item.append_child(&label).ok();
            }
            if !line.text.is_empty() {
                if let Ok(text) = self.document.create_element("span") {
                    text.set_text_content(Some(&format!(" {}", line.text)));
                    item.append_child(&text).ok();
                }
            }
            self.verification_results.append_child(&item).ok();
        }
        self.verification_results.class_list().remove_1("hidden").ok();
    }

    /// Rebuilds the move-log table. Coordinates are shown one-based; the
    /// newest row carries the latest-move marker.
    pub fn render_move_log(&self, log: &[MoveLogEntry]) {
        let display = |pos: Option<Position>| {
            pos.map(|p| format!("({}, {})", p.row + 1, p.col + 1))
                .unwrap_or_default()
        };
        self.move_log_body.set_inner_html("");
        for (index, entry) in log.iter().enumerate() {
            let Ok(row) = self.document.create_element("tr") else {
                continue;
            };
            for (text, class) in [
                (display(entry.human), "black-move"),
                (display(entry.ai), "white-move"),
            ] {
                if let Ok(cell) = self.document.create_element("td") {
                    if !text.is_empty() {
                        cell.set_class_name(class);
                        cell.set_text_content(Some(&text));
                    }
                    row.append_child(&cell).ok();
                }
            }
            if index + 1 == log.len() {
                row.set_class_name("latest-move");
            }
            self.move_log_body.append_child(&row).ok();
        }
        self.move_log_body
            .set_scroll_top(self.move_log_body.scroll_height());
    }

    pub fn panel_has_content(&self) -> bool {
        self.verification_results.child_element_count() > 0
    }

    pub fn hide_panel(&self) {
        self.verification_results.set_inner_html("");
        self.verification_results.class_list().add_1("hidden").ok();
    }

    pub fn show_advisor_panel(&self, html: &str) {
        self.advisor_content.set_inner_html(html);
        self.advisor_panel.class_list().remove_1("hidden").ok();
    }

    pub fn hide_advisor_panel(&self) {
        self.advisor_panel.class_list().add_1("hidden").ok();
    }

    pub fn advisor_panel_open(&self) -> bool {
        !self.advisor_panel.class_list().contains("hidden")
    }

    pub fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            window.alert_with_message(message).ok();
        }
    }

    pub fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}

fn set_enabled(button: &Element, enabled: bool) {
    if enabled {
        button.remove_attribute("disabled").ok();
    } else {
        button.set_attribute("disabled", "").ok();
    }
}
