use crate::engine::PlaybackEngine;
use crate::time::format_time;
use crate::Error;
use std::time::{Duration, Instant};

/// Playback position at one sampling instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSnapshot {
    pub current_ms: u64,
    pub duration_ms: u64,
    pub formatted_current: String,
    pub formatted_duration: String,
}

impl TimelineSnapshot {
    pub fn new(current_ms: u64, duration_ms: u64) -> Self {
        TimelineSnapshot {
            current_ms,
            duration_ms,
            formatted_current: format_time(current_ms),
            formatted_duration: format_time(duration_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running { next: Instant },
    Failed,
}

/// Periodically samples the engine position while it is playing.
///
/// Samples are only produced while the engine reports playback, so consumers
/// see gaps during pauses. The sampler stops for good on its first engine error.
#[derive(Debug, Clone)]
pub struct PositionSampler {
    interval: Duration,
    state: State,
}

impl PositionSampler {
    pub fn new(interval: Duration) -> Self {
        PositionSampler {
            interval,
            state: State::Idle,
        }
    }

    /// Starts sampling, with the first sample due at `now`.
    ///
    /// Restarting a running sampler resets its schedule. A failed sampler stays stopped.
    pub fn start(&mut self, now: Instant) {
        if self.state != State::Failed {
            self.state = State::Running { next: now };
        }
    }

    /// Stops sampling; nothing is produced until the next [`start`](Self::start).
    pub fn cancel(&mut self) {
        if self.state != State::Failed {
            self.state = State::Idle;
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            State::Running { next } => Some(next),
            _ => None,
        }
    }

    /// Takes a sample if one is due at `now` and the engine is playing.
    pub fn poll<E: PlaybackEngine + ?Sized>(
        &mut self,
        engine: &E,
        now: Instant,
    ) -> Result<Option<TimelineSnapshot>, Error> {
        let State::Running { next } = self.state else {
            return Ok(None);
        };
        if now < next {
            return Ok(None);
        }

        // a late poll does not replay the missed intervals
        let mut following = next + self.interval;
        if following <= now {
            following = now + self.interval;
        }
        self.state = State::Running { next: following };

        match sample(engine) {
            Ok(snapshot) => {
                if let Some(snapshot) = &snapshot {
                    log::trace!("sampled {}", snapshot.formatted_current);
                }
                Ok(snapshot)
            }
            Err(err) => {
                self.state = State::Failed;
                Err(err)
            }
        }
    }
}

fn sample<E: PlaybackEngine + ?Sized>(engine: &E) -> Result<Option<TimelineSnapshot>, Error> {
    if !engine.is_playing()? {
        return Ok(None);
    }
    let current = engine.current_position()?.as_millis() as u64;
    let duration = engine.duration()?.as_millis() as u64;
    Ok(Some(TimelineSnapshot::new(current, duration)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeEngine;
    use crate::engine::PlaybackEngine;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn playing_engine() -> FakeEngine {
        FakeEngine {
            playing: true,
            position: Duration::from_millis(61_000),
            duration: Duration::from_millis(3_661_000),
            ..FakeEngine::default()
        }
    }

    #[test]
    fn snapshot_is_formatted_from_its_fields() {
        let snapshot = TimelineSnapshot::new(61_000, 3_661_000);
        assert_eq!(snapshot.formatted_current, "01:01");
        assert_eq!(snapshot.formatted_duration, "01:01:01");
    }

    #[test]
    fn samples_once_per_interval() {
        let start = Instant::now();
        let engine = playing_engine();
        let mut sampler = PositionSampler::new(secs(1));

        assert_eq!(sampler.poll(&engine, start).unwrap(), None);
        sampler.start(start);

        let first = sampler.poll(&engine, start).unwrap().unwrap();
        assert_eq!(first.current_ms, 61_000);
        assert_eq!(sampler.poll(&engine, start + Duration::from_millis(999)).unwrap(), None);
        assert!(sampler.poll(&engine, start + secs(1)).unwrap().is_some());
        assert_eq!(sampler.next_deadline(), Some(start + secs(2)));
    }

    #[test]
    fn nothing_while_paused_and_resumes_within_an_interval() {
        let start = Instant::now();
        let mut engine = playing_engine();
        engine.playing = false;
        let mut sampler = PositionSampler::new(secs(1));
        sampler.start(start);

        for n in 0..5 {
            assert_eq!(sampler.poll(&engine, start + secs(n)).unwrap(), None);
        }

        engine.playing = true;
        let resumed = start + Duration::from_millis(4_500);
        assert_eq!(sampler.poll(&engine, resumed).unwrap(), None);
        assert!(sampler.next_deadline().unwrap() <= resumed + secs(1));
        assert!(sampler.poll(&engine, start + secs(5)).unwrap().is_some());
    }

    #[test]
    fn late_poll_does_not_burst() {
        let start = Instant::now();
        let engine = playing_engine();
        let mut sampler = PositionSampler::new(secs(1));
        sampler.start(start);
        sampler.poll(&engine, start).unwrap();

        let late = start + secs(10);
        assert!(sampler.poll(&engine, late).unwrap().is_some());
        assert_eq!(sampler.poll(&engine, late).unwrap(), None);
        assert_eq!(sampler.next_deadline(), Some(late + secs(1)));
    }

    #[test]
    fn cancel_stops_sampling() {
        let start = Instant::now();
        let engine = playing_engine();
        let mut sampler = PositionSampler::new(secs(1));
        sampler.start(start);
        sampler.cancel();

        assert!(!sampler.is_running());
        assert_eq!(sampler.poll(&engine, start + secs(3)).unwrap(), None);
    }

    #[test]
    fn stops_for_good_on_a_released_engine() {
        let start = Instant::now();
        let mut engine = playing_engine();
        engine.release().unwrap();
        let mut sampler = PositionSampler::new(secs(1));
        sampler.start(start);

        assert!(matches!(sampler.poll(&engine, start), Err(Error::Released)));
        sampler.start(start + secs(1));
        assert!(!sampler.is_running());
        assert_eq!(sampler.poll(&engine, start + secs(2)).unwrap(), None);
    }
}
