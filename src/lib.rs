use wasm_bindgen::prelude::*;

pub mod advisor;
pub mod api;
pub mod persist;
pub mod recovery;
pub mod render;
pub mod round;
pub mod sequencer;
pub mod store;
pub mod turn;
pub mod types;
pub mod verify;

#[cfg(target_arch = "wasm32")]
pub mod app;

/// Module initializer: panic messages and log lines go to the console.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
