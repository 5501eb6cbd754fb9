//! Emotion sources and the shared latest-sample cell.
//!
//! The source is the only writer of the `DetectionCell`; the frame loop only
//! snapshots it. The live source never touches the browser itself: it tells
//! the glue what to do through `LinkCommand`s and is told what happened
//! through `SocketEvent`s, which keeps the reconnect logic testable.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{GameConfig, SourceMode};
use crate::emotion::{DetectionSample, decode_detection};
use crate::rng::EmotionRng;

#[derive(Clone, Debug, Default)]
pub struct DetectionCell(Rc<RefCell<DetectionSample>>);

impl DetectionCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, sample: DetectionSample) {
        *self.0.borrow_mut() = sample;
    }

    pub fn snapshot(&self) -> DetectionSample {
        self.0.borrow().clone()
    }
}

// --- Mock --------------------------------------------------------------------

pub struct MockSource {
    rng: Box<dyn EmotionRng>,
    interval_ms: f64,
    next_at: Option<f64>,
    active: bool,
}

impl MockSource {
    pub fn new(rng: Box<dyn EmotionRng>, interval_ms: f64) -> Self {
        Self {
            rng,
            interval_ms,
            next_at: None,
            active: false,
        }
    }

    fn poll(&mut self, now: f64, cell: &DetectionCell) {
        if !self.active || self.next_at.is_some_and(|at| now < at) {
            return;
        }
        let emotion = self.rng.next_emotion();
        cell.publish(DetectionSample::face(emotion, 1.0, now));
        self.next_at = Some(now + self.interval_ms);
    }
}

// --- Live link -----------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinkState {
    Offline,
    Connecting,
    Open,
    Backoff { retry_at: f64 },
}

/// Work the browser glue must carry out for the live source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkCommand {
    /// Open a new socket; its callbacks must report with this id.
    Connect { id: u64 },
    /// Capture one camera frame and send it on the open socket.
    SendFrame,
    /// Close the current socket without triggering a reconnect.
    Close,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SocketEvent {
    Open,
    Message(String),
    Close,
    Error(String),
}

/// Connection lifecycle: wants-connection flag, backoff and frame pacing.
#[derive(Clone, Debug)]
pub struct LinkSupervisor {
    state: LinkState,
    wanted: bool,
    backoff_ms: f64,
    frame_interval_ms: f64,
    next_frame_at: f64,
}

impl LinkSupervisor {
    pub fn new(backoff_ms: f64, frame_interval_ms: f64) -> Self {
        Self {
            state: LinkState::Offline,
            wanted: false,
            backoff_ms,
            frame_interval_ms,
            next_frame_at: 0.0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    /// Connect on the next poll unless already connected / connecting.
    pub fn activate(&mut self, now: f64) {
        self.wanted = true;
        if self.state == LinkState::Offline {
            self.state = LinkState::Backoff { retry_at: now };
        }
    }

    pub fn deactivate(&mut self) -> Option<LinkCommand> {
        self.wanted = false;
        let prev = std::mem::replace(&mut self.state, LinkState::Offline);
        matches!(prev, LinkState::Open | LinkState::Connecting).then_some(LinkCommand::Close)
    }

    /// Returns `true` when a connect is due (caller allocates the id).
    fn poll_connect(&mut self, now: f64) -> bool {
        match self.state {
            LinkState::Backoff { retry_at } if self.wanted && now >= retry_at => {
                self.state = LinkState::Connecting;
                true
            }
            _ => false,
        }
    }

    fn poll_frame(&mut self, now: f64) -> bool {
        if self.state == LinkState::Open && now >= self.next_frame_at {
            self.next_frame_at = now + self.frame_interval_ms;
            return true;
        }
        false
    }

    pub fn on_open(&mut self, now: f64) {
        if self.state == LinkState::Connecting {
            self.state = LinkState::Open;
            self.next_frame_at = now + self.frame_interval_ms;
        }
    }

    pub fn on_close(&mut self, now: f64) {
        self.state = if self.wanted {
            LinkState::Backoff {
                retry_at: now + self.backoff_ms,
            }
        } else {
            LinkState::Offline
        };
    }
}

pub struct LiveSource {
    link: LinkSupervisor,
    connection: u64,
}

impl LiveSource {
    pub fn new(backoff_ms: f64, frame_interval_ms: f64) -> Self {
        Self {
            link: LinkSupervisor::new(backoff_ms, frame_interval_ms),
            connection: 0,
        }
    }

    pub fn link(&self) -> &LinkSupervisor {
        &self.link
    }

    pub fn connection_id(&self) -> u64 {
        self.connection
    }

    fn poll(&mut self, now: f64) -> Option<LinkCommand> {
        if self.link.poll_connect(now) {
            self.connection += 1;
            log::info!("connecting emotion socket (attempt id {})", self.connection);
            return Some(LinkCommand::Connect {
                id: self.connection,
            });
        }
        self.link.poll_frame(now).then_some(LinkCommand::SendFrame)
    }

    fn on_event(&mut self, id: u64, event: SocketEvent, now: f64, cell: &DetectionCell) {
        if id != self.connection {
            log::debug!("ignoring event from stale socket {id}");
            return;
        }
        match event {
            SocketEvent::Open => {
                log::info!("emotion socket connected");
                self.link.on_open(now);
            }
            SocketEvent::Message(text) => match decode_detection(&text, now) {
                Ok(sample) => cell.publish(sample),
                Err(err) => log::warn!("dropping detection message: {err}"),
            },
            SocketEvent::Close => {
                cell.publish(DetectionSample::no_face(now));
                self.link.on_close(now);
                match self.link.state() {
                    LinkState::Backoff { retry_at } => {
                        log::info!("emotion socket closed, reconnecting at {retry_at:.0}ms")
                    }
                    _ => log::info!("emotion socket closed"),
                }
            }
            SocketEvent::Error(msg) => log::warn!("emotion socket error: {msg}"),
        }
    }
}

// --- Source ----------------------------------------------------------------------

pub enum SourceKind {
    Mock(MockSource),
    Live(LiveSource),
}

/// Either source kind plus the cell it writes.
pub struct EmotionSource {
    kind: SourceKind,
    cell: DetectionCell,
}

impl EmotionSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            cell: DetectionCell::new(),
        }
    }

    pub fn from_config(cfg: &GameConfig, rng: Box<dyn EmotionRng>) -> Self {
        let kind = match cfg.source {
            SourceMode::Mock => SourceKind::Mock(MockSource::new(rng, cfg.mock_interval_ms)),
            SourceMode::Live => {
                SourceKind::Live(LiveSource::new(cfg.reconnect_backoff_ms, cfg.frame_interval_ms))
            }
        };
        Self::new(kind)
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Forgets the last detection, e.g. between rounds.
    pub fn clear_sample(&mut self, now: f64) {
        self.cell.publish(DetectionSample::no_face(now));
    }

    pub fn latest(&self) -> DetectionSample {
        self.cell.snapshot()
    }

    pub fn activate(&mut self, now: f64) {
        match &mut self.kind {
            SourceKind::Mock(m) => {
                m.active = true;
                m.next_at = None;
            }
            SourceKind::Live(l) => l.link.activate(now),
        }
    }

    /// Stops the source. Returns `Close` when a live socket must be shut.
    pub fn deactivate(&mut self, now: f64) -> Option<LinkCommand> {
        let cmd = match &mut self.kind {
            SourceKind::Mock(m) => {
                m.active = false;
                None
            }
            SourceKind::Live(l) => l.link.deactivate(),
        };
        self.cell.publish(DetectionSample::no_face(now));
        cmd
    }

    pub fn poll(&mut self, now: f64) -> Option<LinkCommand> {
        match &mut self.kind {
            SourceKind::Mock(m) => {
                m.poll(now, &self.cell);
                None
            }
            SourceKind::Live(l) => l.poll(now),
        }
    }

    pub fn on_socket_event(&mut self, id: u64, event: SocketEvent, now: f64) {
        if let SourceKind::Live(l) = &mut self.kind {
            l.on_event(id, event, now, &self.cell);
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.kind, SourceKind::Live(_))
    }
}
