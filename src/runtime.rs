use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Interval the main loop ticks at; the session's timing math assumes it.
pub const TICK_RATE_MS: u64 = 100;

/// Everything the main loop reacts to.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
}

/// Where events come from: the terminal in production, a channel in tests.
pub trait EventSource: Send + 'static {
    /// Waits up to `timeout` for the next event; `None` once the source is
    /// exhausted (channel closed).
    fn poll(&self, timeout: Duration) -> Option<AppEvent>;
}

/// Reads crossterm events on a background thread and forwards them.
pub struct TermEventSource {
    rx: Receiver<AppEvent>,
}

impl TermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(w, h)) => {
                    if tx.send(AppEvent::Resize(w, h)).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });
        Self { rx }
    }
}

impl Default for TermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TermEventSource {
    fn poll(&self, timeout: Duration) -> Option<AppEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => Some(AppEvent::Tick),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Channel-fed source for headless tests. Yields the queued events, then
/// reports exhaustion instead of ticking forever.
pub struct ScriptedEventSource {
    rx: Receiver<AppEvent>,
}

impl ScriptedEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }

    /// Convenience pair: a sender for the script and the source itself.
    pub fn channel() -> (mpsc::Sender<AppEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl EventSource for ScriptedEventSource {
    fn poll(&self, timeout: Duration) -> Option<AppEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => Some(AppEvent::Tick),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Pulls one event per iteration of the main loop, synthesizing `Tick` at the
/// fixed rate when the source stays quiet.
pub struct EventPump<S: EventSource> {
    source: S,
    tick_rate: Duration,
}

impl<S: EventSource> EventPump<S> {
    pub fn new(source: S, tick_rate: Duration) -> Self {
        Self { source, tick_rate }
    }

    pub fn next(&self) -> Option<AppEvent> {
        self.source.poll(self.tick_rate)
    }
}
