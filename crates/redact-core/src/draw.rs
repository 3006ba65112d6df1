//! Pointer-driven rectangle drawing
//!
//! The host feeds pointer events into a [`PointerFeed`] from its input
//! thread. The [`DrawMachine`] owns the receiving end and drains it once per
//! tick, so every down/move/up is observed exactly once no matter how often
//! the host repaints.
//!
//! ```text
//!            down (inside canvas)
//!   ┌──────┐ ───────────────────► ┌──────────┐ ◄─┐
//!   │ Idle │                      │ Dragging │   │ move
//!   └──────┘ ◄─────────────────── └──────────┘ ──┘
//!            up (commit or discard)
//! ```

use crate::geometry::{CanvasBounds, Point, Rect};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

/// Producer half of the pointer queue, handed to the host UI.
#[derive(Debug, Clone)]
pub struct PointerFeed {
    tx: Sender<PointerEvent>,
}

impl PointerFeed {
    pub fn down(&self, at: Point) {
        self.send(PointerEvent::Down(at));
    }

    pub fn moved(&self, at: Point) {
        self.send(PointerEvent::Move(at));
    }

    pub fn up(&self, at: Point) {
        self.send(PointerEvent::Up(at));
    }

    pub fn send(&self, event: PointerEvent) {
        if self.tx.send(event).is_err() {
            debug!(?event, "draw machine is gone, pointer event dropped");
        }
    }
}

/// The in-progress gesture. Transitions are pure: each returns the next
/// session instead of mutating shared state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawSession {
    #[default]
    Idle,
    Dragging { origin: Point, live: Point },
}

/// What a finished gesture amounts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// A drag that produced a rectangle worth keeping
    Commit(Rect),
    /// Press and release on the same spot inside the canvas
    Tap(Point),
    /// Anything else: zero area, non-finite, or released outside the canvas
    Discarded,
}

impl DrawSession {
    /// Pointer pressed. Any previous session is dropped.
    pub fn press(self, at: Point, bounds: CanvasBounds) -> Self {
        if bounds.contains(at) {
            DrawSession::Dragging {
                origin: at,
                live: at,
            }
        } else {
            DrawSession::Idle
        }
    }

    pub fn drag(self, to: Point) -> Self {
        match self {
            DrawSession::Dragging { origin, .. } => DrawSession::Dragging { origin, live: to },
            DrawSession::Idle => DrawSession::Idle,
        }
    }

    /// Pointer released. Always returns to `Idle`; the gesture is `None` when
    /// there was nothing in progress.
    pub fn release(self, at: Point, bounds: CanvasBounds) -> (Self, Option<Gesture>) {
        let DrawSession::Dragging { origin, .. } = self else {
            return (DrawSession::Idle, None);
        };

        let rect = Rect::from_points(origin, at);
        let gesture = if !bounds.contains_strict(at) {
            Gesture::Discarded
        } else if rect.is_committable() {
            Gesture::Commit(rect)
        } else if origin == at {
            Gesture::Tap(at)
        } else {
            Gesture::Discarded
        };
        (DrawSession::Idle, Some(gesture))
    }

    /// Live preview rectangle while dragging
    pub fn preview(&self) -> Option<Rect> {
        match self {
            DrawSession::Dragging { origin, live } => Some(Rect::from_points(*origin, *live)),
            DrawSession::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DrawSession::Dragging { .. })
    }
}

/// Result of draining the pointer queue once
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrawTick {
    /// Finished gestures in the order they were released
    pub gestures: Vec<Gesture>,
    /// Number of events consumed this tick
    pub consumed: usize,
}

/// Consumer half of the pointer queue plus the single live session
#[derive(Debug)]
pub struct DrawMachine {
    rx: Receiver<PointerEvent>,
    session: DrawSession,
}

impl DrawMachine {
    pub fn new() -> (Self, PointerFeed) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Self {
                rx,
                session: DrawSession::Idle,
            },
            PointerFeed { tx },
        )
    }

    pub fn session(&self) -> DrawSession {
        self.session
    }

    pub fn preview(&self) -> Option<Rect> {
        self.session.preview()
    }

    /// Drain every queued event. Without bounds (no page on screen) events
    /// are consumed and ignored.
    pub fn tick(&mut self, bounds: Option<CanvasBounds>) -> DrawTick {
        let mut out = DrawTick::default();

        for event in self.rx.try_iter() {
            out.consumed += 1;
            let Some(bounds) = bounds else {
                self.session = DrawSession::Idle;
                continue;
            };

            self.session = match event {
                PointerEvent::Down(at) => self.session.press(at, bounds),
                PointerEvent::Move(at) => self.session.drag(at),
                PointerEvent::Up(at) => {
                    let (next, gesture) = self.session.release(at, bounds);
                    match gesture {
                        Some(Gesture::Discarded) => trace!(?at, "gesture discarded"),
                        Some(g) => out.gestures.push(g),
                        None => {}
                    }
                    next
                }
            };
        }

        out
    }

    /// Drop the live session and anything still queued for it.
    pub fn abandon(&mut self) {
        let dropped = self.rx.try_iter().count();
        if self.session.is_dragging() || dropped > 0 {
            debug!(dropped, "abandoning draw session");
        }
        self.session = DrawSession::Idle;
    }
}
