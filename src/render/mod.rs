pub mod plan;

#[cfg(target_arch = "wasm32")]
pub mod grid;

pub use plan::{CellPatch, plan_cells};
