//! Edge auto-scroll while dragging.

use crate::config::AutoScrollConfig;
use kurbo::{Point, Rect, Vec2};
use std::time::{Duration, Instant};

/// Timer that keeps a drag moving while the pointer sits near a viewport
/// edge. The editor polls it; nothing runs in the background.
#[derive(Debug, Clone)]
pub struct AutoScroller {
    config: AutoScrollConfig,
    /// Unit-ish scroll direction while armed.
    direction: Option<Vec2>,
    last_fire: Option<Instant>,
}

impl AutoScroller {
    pub fn new(config: AutoScrollConfig) -> Self {
        Self {
            config,
            direction: None,
            last_fire: None,
        }
    }

    /// Direction toward the edges within `threshold` of `pointer`.
    ///
    /// Each component is -1, 0 or 1. Zero when the pointer is in the interior.
    pub fn edge_direction(pointer: Point, viewport: Rect, threshold: f64) -> Vec2 {
        let axis = |value: f64, min: f64, max: f64| {
            if value <= min + threshold {
                -1.0
            } else if value >= max - threshold {
                1.0
            } else {
                0.0
            }
        };
        Vec2::new(
            axis(pointer.x, viewport.x0, viewport.x1),
            axis(pointer.y, viewport.y0, viewport.y1),
        )
    }

    /// Arm or disarm from the latest screen pointer. Returns whether armed.
    pub fn update(&mut self, pointer: Point, viewport: Rect, now: Instant) -> bool {
        let direction = Self::edge_direction(pointer, viewport, self.config.edge_threshold);
        if direction == Vec2::ZERO {
            self.disarm();
            return false;
        }
        if self.direction.is_none() {
            log::debug!("Auto-scroll armed toward ({}, {})", direction.x, direction.y);
            self.last_fire = Some(now);
        }
        self.direction = Some(direction);
        true
    }

    /// Scroll accumulated since the last poll, one step per elapsed interval.
    pub fn poll(&mut self, now: Instant) -> Option<Vec2> {
        let direction = self.direction?;
        let last = self.last_fire?;
        let interval = self.interval();
        let elapsed = now.saturating_duration_since(last);
        let ticks = (elapsed.as_millis() / interval.as_millis().max(1)) as u32;
        if ticks == 0 {
            return None;
        }
        self.last_fire = Some(last + interval * ticks);
        Some(direction * (self.config.step * f64::from(ticks)))
    }

    pub fn disarm(&mut self) {
        if self.direction.take().is_some() {
            log::debug!("Auto-scroll disarmed");
        }
        self.last_fire = None;
    }

    pub fn is_armed(&self) -> bool {
        self.direction.is_some()
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }
}
