//! Browser runtime: owns the session, the emotion source and every DOM /
//! socket handle, and drives them from `requestAnimationFrame`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, Window, window};

use super::camera;
use super::capture::FrameCapture;
use super::dom::{self, Hud};
use super::render::Renderer;
use super::socket::{SocketHandle, socket_url};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::rng::Lcg;
use crate::session::{GameSession, GameState, SessionEvent};
use crate::source::{EmotionSource, LinkCommand, LinkState, SocketEvent, SourceKind};

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    static FRAME_LOOP: RefCell<Option<FrameLoop>> = const { RefCell::new(None) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

struct FrameLoop {
    callback: FrameCallback,
    handle: Rc<Cell<Option<i32>>>,
}

struct App {
    session: GameSession,
    source: EmotionSource,
    renderer: Renderer,
    hud: Hud,
    capture: Option<FrameCapture>,
    socket: Option<SocketHandle>,
    socket_url: String,
    camera_warned: bool,
}

fn browser() -> Result<(Window, Document)> {
    let win = window().ok_or(GameError::MissingElement("window"))?;
    let doc = win.document().ok_or(GameError::MissingElement("document"))?;
    Ok((win, doc))
}

fn now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn viewport(win: &Window) -> (f64, f64) {
    let w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
    let h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
    (w, h)
}

fn seed(cfg: &GameConfig) -> u64 {
    cfg.seed
        .unwrap_or_else(|| Lcg::from_entropy(now().to_bits()).next_u32() as u64)
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => slot.as_mut().map(f),
        Err(_) => {
            log::warn!("app busy, dropping re-entrant call");
            None
        }
    })
}

// --- Setup -------------------------------------------------------------------

/// Builds (or rebuilds) the page: canvas, HUD, overlays, camera and input.
/// Leaves the game Idle on the start screen.
pub fn install(config: GameConfig) -> Result<()> {
    let (win, doc) = browser()?;

    if APP.with(|cell| cell.borrow().is_some()) {
        quit();
    }

    let canvas = dom::game_canvas(&doc)?;
    let (w, h) = viewport(&win);
    canvas.set_width(w as u32);
    canvas.set_height(h as u32);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .and_then(|c| c.dyn_into().ok())
        .ok_or(GameError::MissingElement("2d context"))?;

    let (hud, buttons) = Hud::build(&doc)?;
    let base = seed(&config);
    let session = GameSession::new(config.clone(), Box::new(Lcg::new(base)), w, h);
    let source = EmotionSource::from_config(&config, Box::new(Lcg::new(base ^ 0xA5A5)));

    let url = match &config.ws_url {
        Some(url) => url.clone(),
        None => {
            let loc = win.location();
            socket_url(&loc.protocol()?, &loc.host()?, &config.ws_path)
        }
    };

    let mut capture = None;
    if source.is_live() {
        let video = dom::webcam_video(&doc)?;
        capture = Some(FrameCapture::new(
            &doc,
            video.clone(),
            config.capture_width,
            config.capture_height,
            config.capture_quality,
        )?);
        camera::request(video);
    }

    let mut app = App {
        session,
        source,
        renderer: Renderer::new(canvas, ctx),
        hud,
        capture,
        socket: None,
        socket_url: url,
        camera_warned: false,
    };
    app.hud.show_state(GameState::Idle);
    let text = app.emotion_text();
    app.hud.set_emotion(&text);
    app.renderer.draw(&mut app.session, now());
    APP.with(|cell| cell.replace(Some(app)));

    // Listeners are page-lifetime; a reinstall only swaps the app behind them.
    if FRAME_LOOP.with(|l| l.borrow().is_none()) {
        wire_buttons(&buttons)?;
        wire_keys(&doc)?;
        wire_resize(&win)?;
        FRAME_LOOP.with(|l| l.replace(Some(frame_loop())));
    }
    log::info!("emotion express ready ({:?} source)", config.source);
    Ok(())
}

fn wire_buttons(buttons: &dom::Buttons) -> Result<()> {
    dom::on_click(&buttons.start, || report(start()))?;
    dom::on_click(&buttons.restart, || report(start()))?;
    dom::on_click(&buttons.next_round, || report(continue_round()))?;
    dom::on_click(&buttons.quit, quit)?;
    dom::on_click(&buttons.stop, quit)?;
    Ok(())
}

fn wire_keys(doc: &Document) -> Result<()> {
    let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
        let key = evt.key();
        match key.as_str() {
            "Enter" | " " => {
                evt.prevent_default();
                match state() {
                    GameState::RoundComplete => report(continue_round()),
                    GameState::Running => {}
                    GameState::Idle | GameState::Victory => report(start()),
                }
            }
            "Escape" => quit(),
            _ => {}
        }
    }) as Box<dyn FnMut(_)>);
    doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn wire_resize(win: &Window) -> Result<()> {
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
        let Some(win) = window() else { return };
        let (w, h) = viewport(&win);
        let t = now();
        with_app(|app| {
            let canvas = app.renderer.canvas();
            canvas.set_width(w as u32);
            canvas.set_height(h as u32);
            app.session.resize(w, h);
            if !app.session.is_running() {
                app.renderer.draw(&mut app.session, t);
            }
        });
    }) as Box<dyn FnMut(_)>);
    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn report(result: Result<()>) {
    if let Err(err) = result {
        log::warn!("{err}");
    }
}

// --- Frame loop ----------------------------------------------------------------

fn frame_loop() -> FrameLoop {
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let h = handle.clone();
    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        h.set(None);
        let keep_going = with_app(|app| app.frame(ts)).unwrap_or(false);
        if keep_going {
            request_frame();
        }
    }) as Box<dyn FnMut(f64)>));
    FrameLoop { callback, handle }
}

/// Schedules one frame unless one is already pending.
fn request_frame() {
    FRAME_LOOP.with(|l| {
        let l = l.borrow();
        let Some(l) = l.as_ref() else { return };
        if l.handle.get().is_some() {
            return;
        }
        let (Some(win), Some(cb)) = (window(), l.callback.borrow().as_ref().map(|c| {
            c.as_ref().unchecked_ref::<js_sys::Function>().clone()
        })) else {
            return;
        };
        match win.request_animation_frame(&cb) {
            Ok(id) => l.handle.set(Some(id)),
            Err(err) => log::error!("requestAnimationFrame failed: {err:?}"),
        }
    });
}

fn cancel_frame() {
    FRAME_LOOP.with(|l| {
        if let Some(l) = l.borrow().as_ref() {
            if let (Some(id), Some(win)) = (l.handle.take(), window()) {
                win.cancel_animation_frame(id).ok();
            }
        }
    });
}

impl App {
    /// One animation frame. Returns whether another frame is needed.
    fn frame(&mut self, now: f64) -> bool {
        if let Some(cmd) = self.source.poll(now) {
            self.execute(cmd, now);
        }
        let sample = self.source.latest();
        self.session.tick(now, &sample);
        self.renderer.draw(&mut self.session, now);
        self.flush_events(now);
        let text = self.emotion_text();
        self.hud.set_emotion(&text);
        self.session.is_animating()
    }

    fn execute(&mut self, cmd: LinkCommand, now: f64) {
        match cmd {
            LinkCommand::Connect { id } => {
                self.socket = None;
                match SocketHandle::connect(&self.socket_url, id) {
                    Ok(socket) => self.socket = Some(socket),
                    Err(err) => {
                        log::warn!("emotion socket could not be created: {err}");
                        self.source.on_socket_event(id, SocketEvent::Close, now);
                    }
                }
            }
            LinkCommand::SendFrame => {
                let (Some(socket), Some(capture)) = (&self.socket, &self.capture) else {
                    return;
                };
                if let Some(frame) = capture.capture() {
                    if !socket.send_text(&frame) {
                        log::debug!("frame skipped, socket {} not open", socket.id());
                    }
                }
            }
            LinkCommand::Close => self.socket = None,
        }
    }

    fn flush_events(&mut self, now: f64) {
        for event in self.session.drain_events() {
            self.hud.apply(&event);
            match event {
                SessionEvent::StateChanged(GameState::Victory)
                | SessionEvent::StateChanged(GameState::Idle) => self.stop_source(now),
                SessionEvent::GateReset { index, resets } => {
                    log::debug!("gate {index} missed, reset #{resets}");
                }
                _ => {}
            }
        }
    }

    fn stop_source(&mut self, now: f64) {
        if let Some(cmd) = self.source.deactivate(now) {
            self.execute(cmd, now);
        }
    }

    fn emotion_text(&self) -> String {
        if let SourceKind::Live(live) = self.source.kind() {
            match live.link().state() {
                LinkState::Open => {}
                LinkState::Offline => return "📷 Camera idle".to_string(),
                LinkState::Connecting | LinkState::Backoff { .. } => {
                    return "🔄 Connecting...".to_string();
                }
            }
        }
        self.source.latest().hud_text()
    }
}

// --- Actions ---------------------------------------------------------------------

pub fn start() -> Result<()> {
    let t = now();
    with_app(|app| {
        app.session.start(t);
        app.source.clear_sample(t);
        app.source.activate(t);
        app.flush_events(t);
    })
    .ok_or(GameError::MissingElement("game not installed"))?;
    request_frame();
    Ok(())
}

pub fn continue_round() -> Result<()> {
    let t = now();
    with_app(|app| -> Result<()> {
        app.session.continue_next_round(t)?;
        app.source.clear_sample(t);
        app.source.activate(t);
        app.flush_events(t);
        Ok(())
    })
    .ok_or(GameError::MissingElement("game not installed"))??;
    request_frame();
    Ok(())
}

pub fn quit() {
    cancel_frame();
    let t = now();
    with_app(|app| {
        app.session.quit();
        app.flush_events(t);
        app.renderer.draw(&mut app.session, t);
        let text = app.emotion_text();
        app.hud.set_emotion(&text);
    });
}

pub fn state() -> GameState {
    with_app(|app| app.session.state()).unwrap_or(GameState::Idle)
}

// --- Callbacks from socket / camera ----------------------------------------------

pub(super) fn socket_event(id: u64, event: SocketEvent) {
    let t = now();
    with_app(|app| app.source.on_socket_event(id, event, t));
}

pub(super) fn camera_failed(reason: &str) {
    with_app(|app| {
        if app.camera_warned {
            return;
        }
        app.camera_warned = true;
        log::warn!("camera unavailable: {reason}");
        app.hud
            .notice("📷 Camera unavailable. Allow camera access and reload to play with your face.");
    });
}
