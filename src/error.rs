//! Crate-wide error type.
//!
//! Nothing in the frame loop is fatal: decode failures are logged and dropped,
//! connection failures go through the reconnect backoff. `GameError` mostly
//! surfaces at the wasm boundary (bad config, missing DOM, illegal action).

use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::session::GameState;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("malformed config json: {0}")]
    ConfigJson(#[source] serde_json::Error),

    #[error("malformed detection message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    #[error("unknown emotion label `{0}`")]
    UnknownEmotion(String),

    #[error("cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: GameState,
    },

    #[error("missing DOM element `{0}`")]
    MissingElement(&'static str),

    #[error("browser API error: {0}")]
    Js(String),
}

pub type Result<T> = std::result::Result<T, GameError>;

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<JsValue> for GameError {
    fn from(value: JsValue) -> Self {
        GameError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}
