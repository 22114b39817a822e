use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};

use crate::app::SessionEvent;

/// Terminal input and ticks for the local session, read on a background thread.
pub struct EventHandler {
    rx: mpsc::Receiver<SessionEvent>,
    _tx: mpsc::Sender<SessionEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let _tx = tx.clone();

        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate.saturating_sub(last_tick.elapsed());
                if event::poll(timeout).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(Event::Key(key)) => Some(SessionEvent::Key(key)),
                        Ok(Event::Resize(w, h)) => Some(SessionEvent::Resize(w, h)),
                        _ => None,
                    };
                    if let Some(ev) = forwarded {
                        if tx.send(ev).is_err() {
                            return;
                        }
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    let now = Instant::now();
                    let dt = now - last_tick;
                    last_tick = now;
                    if tx.send(SessionEvent::Tick(dt)).is_err() {
                        return;
                    }
                }
            }
        });

        Self { rx, _tx }
    }

    pub fn next(&self) -> anyhow::Result<SessionEvent> {
        Ok(self.rx.recv()?)
    }
}
