//! Sensor feeds
//!
//! Each feed is a background task that polls one perception accessor on a
//! fixed period and publishes the result into a shared slot. Readers get the
//! last published value with no freshness guarantee. Every slot has exactly
//! one writer (its feed), so plain atomics are enough.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::perception::{Direction, Perception};
use crate::{GraspError, Result};

/// Last-write-wins storage for the depth and direction readings
#[derive(Debug)]
pub struct SensorSlots {
    depth_bits: AtomicU64,
    direction: AtomicU8,
    depth_updates: AtomicU64,
    direction_updates: AtomicU64,
}

impl SensorSlots {
    /// Slots start at the unknown-depth sentinel and `Direction::None`
    pub fn new(unknown_depth: f64) -> Self {
        Self {
            depth_bits: AtomicU64::new(unknown_depth.to_bits()),
            direction: AtomicU8::new(Direction::None.to_code()),
            depth_updates: AtomicU64::new(0),
            direction_updates: AtomicU64::new(0),
        }
    }

    pub fn depth(&self) -> f64 {
        f64::from_bits(self.depth_bits.load(Ordering::Acquire))
    }

    pub fn set_depth(&self, depth: f64) {
        self.depth_bits.store(depth.to_bits(), Ordering::Release);
        self.depth_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn direction(&self) -> Direction {
        Direction::from_code(self.direction.load(Ordering::Acquire))
    }

    pub fn set_direction(&self, direction: Direction) {
        self.direction.store(direction.to_code(), Ordering::Release);
        self.direction_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of writes the depth slot has received
    pub fn depth_updates(&self) -> u64 {
        self.depth_updates.load(Ordering::Relaxed)
    }

    pub fn direction_updates(&self) -> u64 {
        self.direction_updates.load(Ordering::Relaxed)
    }
}

/// Handle to one running feed task
pub struct SensorFeed {
    name: &'static str,
    shutdown_signal: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<()>>>,
}

/// Tracks a run of consecutive query failures so each run is logged once
#[derive(Debug, Default)]
struct FailureStreak(AtomicBool);

impl FailureStreak {
    /// Record a failure; true when it opens a new streak
    fn fail(&self) -> bool {
        !self.0.swap(true, Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl SensorFeed {
    /// Poll depth; missing or failed readings publish `unknown_depth`
    pub fn start_depth(
        perception: Arc<dyn Perception>,
        slots: Arc<SensorSlots>,
        period: Duration,
        unknown_depth: f64,
    ) -> Self {
        let streak = FailureStreak::default();
        Self::start("depth", period, move || {
            let depth = match perception.object_depth() {
                Ok(reading) => {
                    streak.clear();
                    reading
                        .filter(|depth| depth.is_finite() && *depth >= 0.0)
                        .unwrap_or(unknown_depth)
                }
                Err(e) => {
                    if streak.fail() {
                        warn!("Depth query failed, publishing unknown depth: {}", e);
                    }
                    unknown_depth
                }
            };
            slots.set_depth(depth);
        })
    }

    /// Poll direction; missing or failed readings publish `Direction::None`
    pub fn start_direction(
        perception: Arc<dyn Perception>,
        slots: Arc<SensorSlots>,
        period: Duration,
    ) -> Self {
        let streak = FailureStreak::default();
        Self::start("direction", period, move || {
            let direction = match perception.object_direction() {
                Ok(reading) => {
                    streak.clear();
                    reading.unwrap_or(Direction::None)
                }
                Err(e) => {
                    if streak.fail() {
                        warn!("Direction query failed, publishing none: {}", e);
                    }
                    Direction::None
                }
            };
            slots.set_direction(direction);
        })
    }

    /// Perception accessors may block, so each poll runs on the blocking pool.
    /// A panicking poll ends the feed and surfaces from [`SensorFeed::stop`].
    fn start<F>(name: &'static str, period: Duration, poll: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let shutdown_signal = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::clone(&shutdown_signal);
        let poll = Arc::new(poll);

        let handle = tokio::spawn(async move {
            debug!("Starting {} feed", name);
            loop {
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                let poll = Arc::clone(&poll);
                tokio::task::spawn_blocking(move || (*poll)()).await?;
                tokio::time::sleep(period).await;
            }
            debug!("{} feed stopped", name);
            Ok::<(), GraspError>(())
        });

        info!("Started {} feed ({}ms period)", name, period.as_millis());
        Self {
            name,
            shutdown_signal,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Signal the task and wait until it has exited
    pub async fn stop(&mut self) -> Result<()> {
        self.shutdown_signal.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.await??;
            info!("Stopped {} feed", self.name);
        }
        Ok(())
    }
}

impl Drop for SensorFeed {
    fn drop(&mut self) {
        // Cannot join here; make sure a forgotten feed does not poll forever
        self.shutdown_signal.store(true, Ordering::Release);
    }
}
