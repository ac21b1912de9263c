use std::time::Duration;

/// Delay between a press and the tap classification that follows it.
pub const TAP_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Presses further apart than this start a new tap sequence.
pub const MULTI_TAP_GAP: Duration = Duration::from_millis(300);

/// Distance in logical pixels a pointer travels on an axis before that axis' drag channel starts.
pub const TOUCH_SLOP: f32 = 8.0;

/// Options of a [`Surface`](crate::Surface).
///
/// Values are taken as given: zero or negative thresholds and timeouts are the
/// caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub start_index: usize,
    pub controller_visibility_time: Duration,
    pub swipe_controller_timeout: Duration,
    pub swipe_threshold: f32,
    pub update_interval: Duration,
    pub auto_play: bool,
    pub seek_step: Duration,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            start_index: 0,
            controller_visibility_time: Duration::from_millis(3000),
            swipe_controller_timeout: Duration::from_millis(600),
            swipe_threshold: 20.0,
            update_interval: Duration::from_secs(1),
            auto_play: true,
            seek_step: Duration::from_millis(10_000),
        }
    }
}

impl SurfaceConfig {
    /// Sets the playlist index played on the first attach.
    pub fn start_index(self, start_index: usize) -> Self {
        SurfaceConfig {
            start_index,
            ..self
        }
    }

    /// Sets how long the controls stay visible during playback before hiding.
    pub fn controller_visibility_time(self, controller_visibility_time: Duration) -> Self {
        SurfaceConfig {
            controller_visibility_time,
            ..self
        }
    }

    /// Sets the settle timeout of multi-tap sequences and seek overlay notifications.
    pub fn swipe_controller_timeout(self, swipe_controller_timeout: Duration) -> Self {
        SurfaceConfig {
            swipe_controller_timeout,
            ..self
        }
    }

    /// Sets the minimum drag delta, in logical pixels, classified as a swipe.
    pub fn swipe_threshold(self, swipe_threshold: f32) -> Self {
        SurfaceConfig {
            swipe_threshold,
            ..self
        }
    }

    /// Sets the interval between timeline samples.
    pub fn update_interval(self, update_interval: Duration) -> Self {
        SurfaceConfig {
            update_interval,
            ..self
        }
    }

    /// Sets whether playback starts as soon as the engine is attached.
    pub fn auto_play(self, auto_play: bool) -> Self {
        SurfaceConfig { auto_play, ..self }
    }

    /// Sets the amount each extra tap of a double-tap sequence accumulates.
    pub fn seek_step(self, seek_step: Duration) -> Self {
        SurfaceConfig { seek_step, ..self }
    }
}
