//! Emotion Express: steer a train through emotion gates by making the face
//! shown on each gate while it crosses the match zone.
//!
//! The gameplay core (`session`, `gate`, `scheduler`, `source`, ...) is plain
//! Rust and runs natively under `cargo test`. `web` binds it to the canvas,
//! the webcam and the classification WebSocket.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod effects;
pub mod emotion;
pub mod error;
pub mod gate;
pub mod layout;
pub mod logging;
pub mod rng;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod source;
pub mod web;

pub use config::{GameConfig, GameVariant, MatchCadence, SourceMode};
pub use emotion::{DetectionSample, Emotion};
pub use error::{GameError, Result};
pub use session::{GameSession, GameState, SessionEvent};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(log::LevelFilter::Info);
}

/// Sets up the page and shows the start screen. `config_json` is a partial
/// `GameConfig`; `{"preset": "express"}` selects the express preset first.
#[wasm_bindgen]
pub fn start_game(config_json: Option<String>) -> std::result::Result<(), JsValue> {
    let config = match config_json.as_deref() {
        Some(json) if !json.trim().is_empty() => GameConfig::from_json(json)?,
        _ => GameConfig::default(),
    };
    logging::init(config.log_level);
    web::app::install(config)?;
    Ok(())
}

/// Starts a new game from round one. Also restarts a running game.
#[wasm_bindgen(js_name = start)]
pub fn start_session() -> std::result::Result<(), JsValue> {
    web::app::start()?;
    Ok(())
}

#[wasm_bindgen]
pub fn continue_next_round() -> std::result::Result<(), JsValue> {
    web::app::continue_round()?;
    Ok(())
}

#[wasm_bindgen]
pub fn quit_game() {
    web::app::quit();
}

/// `idle`, `running`, `round_complete` or `victory`.
#[wasm_bindgen]
pub fn game_state() -> String {
    web::app::state().as_str().to_string()
}
