//! # Event Loop
//!
//! Drives a [`FaceController`] from a single async task. Platform events arrive
//! as [`FaceEvent`]s on an mpsc channel; the per-second wake is a tokio sleep
//! armed from the delay the controller hands back. Every update goes straight
//! to the renderer.

use crate::{controller::FaceController, renderer::Renderer, ClockSnapshot};
use chrono::{FixedOffset, Utc};
use log::{debug, info, warn};
use std::future;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};

/// Discrete events delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceEvent {
    /// Face became visible
    Resume,
    /// Face was hidden
    Pause,
    /// Display entered or left low-power mode
    DimChanged(bool),
    /// Periodic system tick (once a minute)
    Tick,
    /// Time zone or wall clock changed; carries the new offset if known
    TimeZoneOrClockChanged(Option<FixedOffset>),
    SetLocation { latitude: f64, longitude: f64 },
    ClearLocation,
    /// Tear down the loop
    Shutdown,
}

/// Source of wall-clock time in Unix milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Everything the loop needs besides the event channel.
pub struct FaceLoop<R, C> {
    pub controller: FaceController,
    pub renderer: R,
    pub clock: C,
    pub is_24_hour: bool,
}

impl<R: Renderer, C: Clock> FaceLoop<R, C> {
    pub fn new(controller: FaceController, renderer: R, clock: C, is_24_hour: bool) -> Self {
        Self {
            controller,
            renderer,
            clock,
            is_24_hour,
        }
    }

    /// Run until `Shutdown` arrives or every sender is dropped.
    ///
    /// Returns the number of snapshots rendered. Pending events are always
    /// handled before a due wake.
    pub async fn run(&mut self, mut events: mpsc::Receiver<FaceEvent>) -> usize {
        let mut rendered = 0;
        let mut wake_at: Option<Instant> = None;

        loop {
            let deadline = wake_at;
            let wake = async move {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("event channel closed, stopping");
                        break;
                    };
                    if event == FaceEvent::Shutdown {
                        info!("shutting down face loop");
                        break;
                    }
                    let (snapshot, next) = self.handle(event);
                    if let Some(snapshot) = snapshot {
                        self.draw(&snapshot);
                        rendered += 1;
                    }
                    match next {
                        Wake::Keep => {}
                        Wake::Cancel => wake_at = None,
                        Wake::In(delay) => wake_at = Some(in_millis(delay)),
                    }
                }
                _ = wake => {
                    let now = self.clock.now_millis();
                    let update = self.controller.on_wake(now, self.is_24_hour);
                    self.draw(&update.snapshot);
                    rendered += 1;
                    wake_at = update.next_wake_in.map(in_millis);
                }
            }
        }

        self.controller.pause(self.clock.now_millis(), self.is_24_hour);
        rendered
    }

    fn handle(&mut self, event: FaceEvent) -> (Option<ClockSnapshot>, Wake) {
        let now = self.clock.now_millis();
        let is_24_hour = self.is_24_hour;
        debug!("event {event:?} at {now}");

        match event {
            FaceEvent::Resume => {
                let update = self.controller.resume(now, is_24_hour);
                (Some(update.snapshot), Wake::from(update.next_wake_in))
            }
            FaceEvent::Pause => {
                let update = self.controller.pause(now, is_24_hour);
                (Some(update.snapshot), Wake::Cancel)
            }
            FaceEvent::DimChanged(dimmed) => {
                self.controller.on_dim_state_changed(dimmed);
                let next = match self.controller.reschedule(now) {
                    Some(delay) => Wake::In(delay),
                    None => Wake::Keep,
                };
                (Some(self.controller.on_tick(now, is_24_hour)), next)
            }
            FaceEvent::Tick => (Some(self.controller.on_tick(now, is_24_hour)), Wake::Keep),
            FaceEvent::TimeZoneOrClockChanged(offset) => {
                let snapshot = self
                    .controller
                    .on_time_zone_or_clock_changed(now, is_24_hour, offset);
                (Some(snapshot), Wake::Keep)
            }
            FaceEvent::SetLocation {
                latitude,
                longitude,
            } => match self.controller.set_location(latitude, longitude) {
                Ok(()) => (Some(self.controller.on_tick(now, is_24_hour)), Wake::Keep),
                Err(e) => {
                    warn!("ignoring location update: {e}");
                    (None, Wake::Keep)
                }
            },
            FaceEvent::ClearLocation => {
                self.controller.clear_location();
                (Some(self.controller.on_tick(now, is_24_hour)), Wake::Keep)
            }
            FaceEvent::Shutdown => (None, Wake::Cancel),
        }
    }

    fn draw(&mut self, snapshot: &ClockSnapshot) {
        if let Err(e) = self.renderer.render(snapshot) {
            warn!("render failed: {e}");
        }
    }
}

enum Wake {
    Keep,
    Cancel,
    In(i64),
}

impl From<Option<i64>> for Wake {
    fn from(delay: Option<i64>) -> Self {
        delay.map_or(Wake::Cancel, Wake::In)
    }
}

fn in_millis(delay: i64) -> Instant {
    Instant::now() + Duration::from_millis(delay.max(0) as u64)
}
