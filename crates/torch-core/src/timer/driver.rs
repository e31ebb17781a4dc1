//! Async shell around [`TimerEngine`].
//!
//! The driver owns the engine and the single ticker task. Both live behind
//! one mutex, so replacing the ticker handle and changing the session happen
//! together. Every event the engine produces is published on a channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use super::engine::{TickerDirective, TimerEngine};
use super::session::{Durations, TimerSession, TimerState};
use crate::events::Event;

struct DriverState {
    engine: TimerEngine,
    ticker: Option<JoinHandle<()>>,
    /// Bumped on every (re)schedule; a ticker from an older generation stops.
    generation: u64,
}

impl DriverState {
    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct TimerDriver {
    state: Arc<Mutex<DriverState>>,
    events: mpsc::UnboundedSender<Event>,
    tick_interval: Duration,
}

impl TimerDriver {
    /// Create a driver for `engine` and the receiving end of its event stream.
    pub fn new(engine: TimerEngine) -> (Self, mpsc::UnboundedReceiver<Event>) {
        Self::with_tick_interval(engine, Duration::from_secs(1))
    }

    pub fn with_tick_interval(
        engine: TimerEngine,
        tick_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Self {
            state: Arc::new(Mutex::new(DriverState {
                engine,
                ticker: None,
                generation: 0,
            })),
            events: tx,
            tick_interval,
        };
        (driver, rx)
    }

    pub async fn session(&self) -> TimerSession {
        self.state.lock().await.engine.session().clone()
    }

    /// Current state as an [`Event::StateSnapshot`].
    pub async fn snapshot(&self) -> Event {
        self.state.lock().await.engine.snapshot()
    }

    /// Whether a ticker task is currently alive.
    pub async fn is_ticking(&self) -> bool {
        self.state
            .lock()
            .await
            .ticker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn start(&self) -> TimerSession {
        self.run(|engine| engine.start()).await
    }

    pub async fn pause(&self) -> TimerSession {
        self.run(|engine| engine.pause()).await
    }

    pub async fn reset(&self) -> TimerSession {
        self.run(|engine| engine.reset()).await
    }

    pub async fn set_durations(&self, durations: Durations) -> TimerSession {
        self.run(|engine| engine.set_durations(durations)).await
    }

    async fn run<F>(&self, command: F) -> TimerSession
    where
        F: FnOnce(&mut TimerEngine) -> Option<Event>,
    {
        let mut guard = self.state.lock().await;
        let event = command(&mut guard.engine);
        match guard.engine.last_directive() {
            TickerDirective::Keep => {}
            TickerDirective::Cancel => {
                guard.cancel_ticker();
                debug!("ticker cancelled");
            }
            TickerDirective::Schedule => self.spawn_ticker(&mut guard),
        }
        if let Some(event) = event {
            log_event(&event);
            let _ = self.events.send(event);
        }
        guard.engine.session().clone()
    }

    fn spawn_ticker(&self, guard: &mut DriverState) {
        guard.cancel_ticker();
        guard.generation = guard.generation.wrapping_add(1);

        let generation = guard.generation;
        let state = self.state.clone();
        let events = self.events.clone();
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;

                let mut guard = state.lock().await;
                if guard.generation != generation || guard.engine.state() != TimerState::Running {
                    break;
                }
                let event = guard.engine.tick();
                let finished = guard.engine.last_directive() == TickerDirective::Cancel;
                if finished {
                    // This task is the live ticker; drop our own handle instead of aborting.
                    guard.ticker = None;
                }
                drop(guard);

                if let Some(event) = event {
                    log_event(&event);
                    let _ = events.send(event);
                }
                if finished {
                    break;
                }
            }
        });

        guard.ticker = Some(handle);
        debug!(generation, "ticker scheduled");
    }
}

fn log_event(event: &Event) {
    match event {
        Event::TimerStarted {
            phase,
            remaining_secs,
            resumed,
            ..
        } => info!(?phase, remaining_secs, resumed, "timer started"),
        Event::TimerPaused { remaining_secs, .. } => info!(remaining_secs, "timer paused"),
        Event::TimerReset { remaining_secs, .. } => info!(remaining_secs, "timer reset"),
        Event::PhaseCompleted {
            completed,
            next,
            cycle_count,
            ..
        } => info!(?completed, ?next, cycle_count, "phase completed"),
        Event::DurationsChanged { durations, .. } => info!(?durations, "durations changed"),
        Event::Ticked { .. } | Event::StateSnapshot { .. } => {}
    }
}
