//! # Render Simulation
//!
//! Pretends to render: a ticker adds samples until the configured maximum
//! is reached. Nothing is actually drawn.
//!
//! ## State Machine
//! ```text
//!            restart (target set)         samples == max
//!  Stopped ───────────────────► Rendering ──────────────► Finished
//!     ▲   restart (no target)      │  ▲
//!     │ ──────────────► Failed   pause continue
//!     │                            ▼  │
//!     └──────── stop ─────────── Paused
//! ```

use std::time::{Duration, Instant};

use octane_core::{RenderState, RenderStatistics};

/// Largest film width or height a render uses. Larger pin values are
/// clamped.
pub const MAX_IMAGE_DIMENSION: u32 = 8192;

/// Settings a render starts with, read from the render target's pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub max_samples: u32,
    pub width: u32,
    pub height: u32,
}

/// A callback id together with the subscriber whose stream receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstalledCallback {
    pub subscriber_id: u64,
    pub callback_id: u64,
}

/// Installs a callback into `slot`, or clears it when `callback_id` is 0.
///
/// A subscriber can only clear its own callback; a clear from anyone else
/// leaves the slot alone. Returns true if the slot changed.
pub fn set_callback(slot: &mut Option<InstalledCallback>, subscriber_id: u64, callback_id: u64) -> bool {
    if callback_id != 0 {
        *slot = Some(InstalledCallback {
            subscriber_id,
            callback_id,
        });
        return true;
    }
    match slot {
        Some(installed) if installed.subscriber_id == subscriber_id => {
            *slot = None;
            true
        }
        _ => false,
    }
}

/// Render progress and installed callbacks.
#[derive(Debug, Default)]
pub struct RenderSim {
    state: RenderState,
    samples: u32,
    settings: Option<RenderSettings>,
    /// Render time before the current running stretch.
    accumulated: Duration,
    running_since: Option<Instant>,
    /// Scene revision the current render started from.
    pub rendered_revision: u64,
    pub new_image_callback: Option<InstalledCallback>,
    pub render_failure_callback: Option<InstalledCallback>,
}

impl RenderSim {
    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == RenderState::Paused
    }

    /// True once at least one sample exists.
    pub fn has_image(&self) -> bool {
        self.samples > 0
    }

    pub fn settings(&self) -> Option<RenderSettings> {
        self.settings
    }

    /// Starts over from sample zero.
    pub fn restart(&mut self, settings: RenderSettings, revision: u64) {
        self.state = RenderState::Rendering;
        self.samples = 0;
        self.settings = Some(settings);
        self.accumulated = Duration::ZERO;
        self.running_since = Some(Instant::now());
        self.rendered_revision = revision;
    }

    /// Marks the render as failed.
    pub fn fail(&mut self) {
        self.stop();
        self.state = RenderState::Failed;
    }

    pub fn stop(&mut self) {
        self.state = RenderState::Stopped;
        self.samples = 0;
        self.settings = None;
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    pub fn pause(&mut self) {
        if self.state == RenderState::Rendering {
            self.state = RenderState::Paused;
            if let Some(since) = self.running_since.take() {
                self.accumulated += since.elapsed();
            }
        }
    }

    pub fn resume(&mut self) {
        if self.state == RenderState::Paused {
            self.state = RenderState::Rendering;
            self.running_since = Some(Instant::now());
        }
    }

    /// Advances a running render. Returns true if new samples were added.
    pub fn tick(&mut self, samples_per_tick: u32) -> bool {
        let Some(settings) = self.settings else {
            return false;
        };
        if self.state != RenderState::Rendering {
            return false;
        }

        self.samples = self
            .samples
            .saturating_add(samples_per_tick)
            .min(settings.max_samples);
        if self.samples >= settings.max_samples {
            self.state = RenderState::Finished;
            if let Some(since) = self.running_since.take() {
                self.accumulated += since.elapsed();
            }
        }
        true
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map(|since| since.elapsed()).unwrap_or_default()
    }

    pub fn statistics(&self) -> RenderStatistics {
        let settings = self.settings.unwrap_or(RenderSettings {
            max_samples: 0,
            width: 0,
            height: 0,
        });
        RenderStatistics {
            samples: self.samples,
            max_samples: settings.max_samples,
            progress: RenderStatistics::progress_of(self.samples, settings.max_samples),
            state: self.state,
            width: settings.width,
            height: settings.height,
            elapsed: self.elapsed(),
        }
    }
}

/// Placeholder image: a binary PPM with a horizontal gradient.
///
/// Returns `None` when either side exceeds [`MAX_IMAGE_DIMENSION`].
pub fn placeholder_ppm(width: u32, height: u32) -> Option<Vec<u8>> {
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return None;
    }
    let header = format!("P6\n{} {}\n255\n", width, height);
    let pixels = (width as usize).checked_mul(height as usize)?.checked_mul(3)?;
    let mut data = Vec::with_capacity(header.len() + pixels);
    data.extend_from_slice(header.as_bytes());

    let row: Vec<u8> = (0..u64::from(width))
        .flat_map(|x| {
            let shade = (x * 255 / u64::from(width.max(1))) as u8;
            [shade, shade, 255 - shade]
        })
        .collect();
    for _ in 0..height {
        data.extend_from_slice(&row);
    }
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: RenderSettings = RenderSettings {
        max_samples: 40,
        width: 8,
        height: 4,
    };

    #[test]
    fn test_tick_until_finished() {
        let mut sim = RenderSim::default();
        assert!(!sim.tick(16));

        sim.restart(SETTINGS, 0);
        assert!(sim.tick(16));
        assert!(sim.tick(16));
        assert_eq!(sim.statistics().samples, 32);
        assert!(sim.tick(16));

        let stats = sim.statistics();
        assert_eq!(stats.samples, 40);
        assert_eq!(stats.state, RenderState::Finished);
        assert_eq!(stats.progress, 1.0);
        assert!(!sim.tick(16));
    }

    #[test]
    fn test_pause_holds_progress() {
        let mut sim = RenderSim::default();
        sim.restart(SETTINGS, 0);
        sim.tick(8);
        sim.pause();
        assert!(sim.is_paused());
        assert!(!sim.tick(8));
        assert_eq!(sim.statistics().samples, 8);

        sim.resume();
        assert!(sim.tick(8));
        assert_eq!(sim.statistics().samples, 16);
    }

    #[test]
    fn test_stop_and_fail_reset() {
        let mut sim = RenderSim::default();
        sim.restart(SETTINGS, 0);
        sim.tick(8);
        sim.stop();
        assert_eq!(sim.state(), RenderState::Stopped);
        assert!(!sim.has_image());

        sim.fail();
        assert_eq!(sim.state(), RenderState::Failed);
        assert_eq!(sim.statistics().max_samples, 0);
    }

    #[test]
    fn test_placeholder_ppm_size() {
        let image = placeholder_ppm(8, 4).unwrap();
        assert!(image.starts_with(b"P6\n8 4\n255\n"));
        assert_eq!(image.len(), "P6\n8 4\n255\n".len() + 8 * 4 * 3);
    }

    #[test]
    fn test_placeholder_ppm_rejects_huge_film() {
        assert!(placeholder_ppm(70_000, 70_000).is_none());
        assert!(placeholder_ppm(MAX_IMAGE_DIMENSION + 1, 1).is_none());
        assert!(placeholder_ppm(1, MAX_IMAGE_DIMENSION + 1).is_none());

        // Wide rows still shade without overflowing
        let image = placeholder_ppm(MAX_IMAGE_DIMENSION, 1).unwrap();
        let header = format!("P6\n{} 1\n255\n", MAX_IMAGE_DIMENSION);
        assert_eq!(image.len(), header.len() + MAX_IMAGE_DIMENSION as usize * 3);
        assert_eq!(&image[image.len() - 3..], &[254, 254, 1]);
    }

    #[test]
    fn test_callback_slot_ownership() {
        let mut slot = None;
        assert!(set_callback(&mut slot, 1, 5));
        assert!(set_callback(&mut slot, 2, 1));
        assert_eq!(
            slot,
            Some(InstalledCallback {
                subscriber_id: 2,
                callback_id: 1
            })
        );

        // Subscriber 1 was replaced and cannot clear subscriber 2's callback
        assert!(!set_callback(&mut slot, 1, 0));
        assert!(slot.is_some());

        assert!(set_callback(&mut slot, 2, 0));
        assert_eq!(slot, None);
        assert!(!set_callback(&mut slot, 2, 0));
    }
}
