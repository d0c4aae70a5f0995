use std::time::{Duration, Instant};

/// Milliseconds of wall time per unit of animation time.
pub const TIME_SCALE_MS: f64 = 2000.0;

/// Maps a frame timestamp (milliseconds since the loop started) to animation time.
///
/// `2000.0` maps to `1.0`. Non-finite and negative timestamps map to `0.0`.
pub fn elapsed_seconds(timestamp_ms: f64) -> f32 {
    if !timestamp_ms.is_finite() || timestamp_ms <= 0.0 {
        return 0.0;
    }
    (timestamp_ms / TIME_SCALE_MS) as f32
}

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds (clamped).
    pub dt: f32,

    /// Milliseconds since the first tick of the clock. Monotonic, unclamped.
    pub timestamp_ms: f64,

    /// Animation time derived from `timestamp_ms` (see [`elapsed_seconds`]).
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// The timestamp origin is the first tick, so the first frame always sees
/// `timestamp_ms == 0.0`.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls. The timestamp is never clamped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Option<Instant>,
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    ///
    /// Clamp rationale:
    /// - minimum prevents zero-dt behavior from tight loops on some platforms
    /// - maximum prevents animation jumps after long stalls
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            origin: None,
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the delta-time baseline. The timestamp origin is kept.
    ///
    /// Useful after surface reconfigure events or when resuming from suspension.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let origin = *self.origin.get_or_insert(now);

        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).clamp(self.dt_min, self.dt_max),
            None => self.dt_min,
        };
        self.last = Some(now);

        let timestamp_ms = now.saturating_duration_since(origin).as_secs_f64() * 1000.0;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            timestamp_ms,
            elapsed: elapsed_seconds(timestamp_ms),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── elapsed_seconds ───────────────────────────────────────────────────

    #[test]
    fn two_seconds_is_one_unit() {
        assert_eq!(elapsed_seconds(2000.0), 1.0);
    }

    #[test]
    fn zero_is_zero() {
        assert_eq!(elapsed_seconds(0.0), 0.0);
    }

    #[test]
    fn scaling_is_linear() {
        assert!(close(elapsed_seconds(500.0), 0.25));
        assert!(close(elapsed_seconds(7000.0), 3.5));
    }

    #[test]
    fn garbage_timestamps_map_to_zero() {
        assert_eq!(elapsed_seconds(f64::NAN), 0.0);
        assert_eq!(elapsed_seconds(f64::INFINITY), 0.0);
        assert_eq!(elapsed_seconds(-10.0), 0.0);
    }

    // ── FrameClock ────────────────────────────────────────────────────────

    #[test]
    fn first_tick_is_time_zero() {
        let mut clock = FrameClock::new();
        let ft = clock.tick_at(Instant::now());
        assert_eq!(ft.timestamp_ms, 0.0);
        assert_eq!(ft.elapsed, 0.0);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn timestamp_follows_wall_time() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        let ft = clock.tick_at(start + Duration::from_millis(2000));
        assert!((ft.timestamp_ms - 2000.0).abs() < 1e-6);
        assert!(close(ft.elapsed, 1.0));
        assert_eq!(ft.frame_index, 1);
    }

    #[test]
    fn dt_is_clamped_but_timestamp_is_not() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        let ft = clock.tick_at(start + Duration::from_secs(10));
        assert!(close(ft.dt, 0.25));
        assert!((ft.timestamp_ms - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn dt_has_a_floor() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        let ft = clock.tick_at(start);
        assert!(close(ft.dt, 0.0001));
    }

    #[test]
    fn reset_keeps_origin() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        clock.reset();
        let ft = clock.tick_at(start + Duration::from_secs(4));
        assert!(close(ft.elapsed, 2.0));
        assert!(close(ft.dt, 0.0001));
    }
}
