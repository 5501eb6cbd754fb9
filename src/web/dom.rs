//! HUD and overlay screens. Elements are reused when the host page already
//! provides them, otherwise created with inline styles.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, HtmlVideoElement};

use crate::error::{GameError, Result};
use crate::session::{GameState, SessionEvent};

pub const CANVAS_ID: &str = "ee-game-canvas";
pub const VIDEO_ID: &str = "ee-webcam";

const OVERLAY_STYLE: &str = "position:fixed; inset:0; display:none; flex-direction:column; align-items:center; justify-content:center; gap:14px; background:rgba(8,8,20,0.72); color:#e2e8f0; font-family:system-ui, sans-serif; z-index:50;";
const BUTTON_STYLE: &str = "padding:10px 26px; font-size:17px; font-weight:600; border:none; border-radius:999px; background:#6366f1; color:#fff; cursor:pointer;";
const CHIP_STYLE: &str = "padding:4px 10px; background:rgba(0,0,0,0.45); border:1px solid #334155; border-radius:6px;";

fn ensure(doc: &Document, parent: &Element, id: &str, tag: &str, style: &str) -> Result<Element> {
    if let Some(el) = doc.get_element_by_id(id) {
        return Ok(el);
    }
    let el = doc.create_element(tag)?;
    el.set_id(id);
    el.set_attribute("style", style).ok();
    parent.append_child(&el)?;
    Ok(el)
}

fn button(doc: &Document, parent: &Element, id: &str, text: &str) -> Result<Element> {
    let fresh = doc.get_element_by_id(id).is_none();
    let el = ensure(doc, parent, id, "button", BUTTON_STYLE)?;
    if fresh {
        el.set_text_content(Some(text));
    }
    Ok(el)
}

fn set_visible(el: &Element, display: &str) {
    if let Some(h) = el.dyn_ref::<HtmlElement>() {
        h.style().set_property("display", display).ok();
    }
}

pub fn body(doc: &Document) -> Result<Element> {
    doc.body()
        .map(Element::from)
        .ok_or(GameError::MissingElement("body"))
}

pub fn game_canvas(doc: &Document) -> Result<HtmlCanvasElement> {
    let body = body(doc)?;
    let el = ensure(
        doc,
        &body,
        CANVAS_ID,
        "canvas",
        "position:fixed; inset:0; width:100%; height:100%; background:linear-gradient(#0f172a,#1e1b4b); z-index:10;",
    )?;
    el.dyn_into::<HtmlCanvasElement>()
        .map_err(|_| GameError::MissingElement(CANVAS_ID))
}

pub fn webcam_video(doc: &Document) -> Result<HtmlVideoElement> {
    let body = body(doc)?;
    let el = ensure(
        doc,
        &body,
        VIDEO_ID,
        "video",
        "position:fixed; right:14px; bottom:14px; width:180px; border-radius:10px; border:2px solid #6366f1; transform:scaleX(-1); z-index:40;",
    )?;
    for attr in ["autoplay", "muted", "playsinline"] {
        el.set_attribute(attr, "").ok();
    }
    el.dyn_into::<HtmlVideoElement>()
        .map_err(|_| GameError::MissingElement(VIDEO_ID))
}

/// Buttons the glue wires click handlers onto.
pub struct Buttons {
    pub start: Element,
    pub stop: Element,
    pub next_round: Element,
    pub quit: Element,
    pub restart: Element,
}

pub struct Hud {
    gate: Element,
    round: Element,
    emotion: Element,
    notice: Element,
    start_screen: Element,
    round_screen: Element,
    round_title: Element,
    round_info: Element,
    victory_screen: Element,
    last_emotion: String,
}

impl Hud {
    pub fn build(doc: &Document) -> Result<(Self, Buttons)> {
        let body = body(doc)?;

        let bar = ensure(
            doc,
            &body,
            "ee-hud",
            "div",
            "position:fixed; top:10px; left:12px; right:12px; display:flex; gap:10px; align-items:center; font-family:'Fira Code', monospace; font-size:15px; color:#fbbf24; z-index:45;",
        )?;
        let round = ensure(doc, &bar, "ee-hud-round", "span", CHIP_STYLE)?;
        let gate = ensure(doc, &bar, "ee-hud-gate", "span", CHIP_STYLE)?;
        let emotion = ensure(doc, &bar, "ee-hud-emotion", "span", CHIP_STYLE)?;
        let stop = button(doc, &bar, "ee-btn-stop", "■ Stop")?;
        let notice = ensure(
            doc,
            &body,
            "ee-notice",
            "div",
            "position:fixed; bottom:14px; left:50%; transform:translateX(-50%); display:none; padding:6px 12px; background:rgba(127,29,29,0.85); color:#fee2e2; border-radius:6px; font-family:system-ui, sans-serif; z-index:60;",
        )?;

        let start_screen = ensure(doc, &body, "ee-start-screen", "div", OVERLAY_STYLE)?;
        let title = ensure(doc, &start_screen, "ee-start-title", "h1", "margin:0;")?;
        if title.text_content().unwrap_or_default().is_empty() {
            title.set_text_content(Some("🚂 Emotion Express"));
        }
        let hint = ensure(doc, &start_screen, "ee-start-hint", "p", "margin:0; opacity:.8;")?;
        if hint.text_content().unwrap_or_default().is_empty() {
            hint.set_text_content(Some(
                "Make the face on each gate while it crosses the match zone.",
            ));
        }
        let start = button(doc, &start_screen, "ee-btn-start", "Start")?;

        let round_screen = ensure(doc, &body, "ee-round-complete-screen", "div", OVERLAY_STYLE)?;
        let round_title = ensure(doc, &round_screen, "ee-round-title", "h2", "margin:0;")?;
        let round_info = ensure(doc, &round_screen, "ee-round-info", "p", "margin:0;")?;
        let next_round = button(doc, &round_screen, "ee-btn-continue", "Next round")?;
        let quit = button(doc, &round_screen, "ee-btn-quit", "Quit")?;

        let victory_screen = ensure(doc, &body, "ee-win-screen", "div", OVERLAY_STYLE)?;
        let win_title = ensure(doc, &victory_screen, "ee-win-title", "h1", "margin:0;")?;
        if win_title.text_content().unwrap_or_default().is_empty() {
            win_title.set_text_content(Some("🏆 You made it!"));
        }
        let restart = button(doc, &victory_screen, "ee-btn-restart", "Play again")?;

        let hud = Self {
            gate,
            round,
            emotion,
            notice,
            start_screen,
            round_screen,
            round_title,
            round_info,
            victory_screen,
            last_emotion: String::new(),
        };
        let buttons = Buttons {
            start,
            stop,
            next_round,
            quit,
            restart,
        };
        Ok((hud, buttons))
    }

    pub fn set_round(&self, round: u32) {
        self.round.set_text_content(Some(&format!("Round {round}")));
    }

    pub fn set_gates(&self, passed: usize, required: usize) {
        self.gate
            .set_text_content(Some(&format!("Gate {passed} / {required}")));
    }

    /// Skips the DOM write when the text did not change.
    pub fn set_emotion(&mut self, text: &str) {
        if self.last_emotion != text {
            self.emotion.set_text_content(Some(text));
            self.last_emotion = text.to_string();
        }
    }

    pub fn notice(&self, text: &str) {
        self.notice.set_text_content(Some(text));
        set_visible(&self.notice, "block");
    }

    /// Shows exactly the overlay that belongs to `state`.
    pub fn show_state(&self, state: GameState) {
        let screens = [
            (&self.start_screen, GameState::Idle),
            (&self.round_screen, GameState::RoundComplete),
            (&self.victory_screen, GameState::Victory),
        ];
        for (el, owner) in screens {
            set_visible(el, if owner == state { "flex" } else { "none" });
        }
    }

    pub fn apply(&self, event: &SessionEvent) {
        match event {
            SessionEvent::StateChanged(state) => self.show_state(*state),
            SessionEvent::RoundStarted { round, required } => {
                self.set_round(*round);
                self.set_gates(0, *required);
            }
            SessionEvent::GatePassed { passed, required } => self.set_gates(*passed, *required),
            SessionEvent::RoundComplete {
                round,
                next_required,
            } => {
                self.round_title
                    .set_text_content(Some(&format!("Round {round} complete!")));
                self.round_info.set_text_content(Some(&format!(
                    "Next round: {next_required} gates"
                )));
            }
            SessionEvent::GateSpawned { .. }
            | SessionEvent::GateMatched { .. }
            | SessionEvent::GateReset { .. }
            | SessionEvent::Victory { .. } => {}
        }
    }
}

/// Adds a listener that lives as long as the page.
pub fn on_click(el: &Element, mut f: impl FnMut() + 'static) -> Result<()> {
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| f()) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}
