//! Visibility state of the main controls and the seek overlay.

use crate::config::{SurfaceConfig, TAP_SETTLE_DELAY};
use crate::gesture::{self, Channel, Input, ScreenHalf, Swipe, TapState};
use crate::sampler::TimelineSnapshot;
use crate::timer::Timers;
use iced::Point;
use std::time::Instant;

/// Notification for the embedding application, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Swipe(Swipe),
    /// Accumulated forward seek of the current double-tap sequence, in milliseconds.
    NextDoubleTap(u64),
    /// Accumulated backward seek of the current double-tap sequence, in milliseconds.
    PrevDoubleTap(u64),
    /// Shown immediately; hidden only after the swipe timeout has passed.
    SeekOverlayVisibility(bool),
    SingleTap,
    ControlsVisibility(bool),
    Timeline(TimelineSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    pub controls_visible: bool,
    pub seek_overlay_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKey {
    TapSettle,
    TapReset,
    AutoHide,
    OverlayHiddenNotice,
}

/// Drives [`VisibilityState`] from gesture input, playback state and timers.
#[derive(Debug, Clone)]
pub struct Controls {
    config: SurfaceConfig,
    width: f32,
    visibility: VisibilityState,
    playing: bool,
    click_enabled: bool,
    vertical_swiping: bool,
    horizontal_swiping: bool,
    taps: TapState,
    last_press: Point,
    timers: Timers<TimerKey>,
    events: Vec<Event>,
}

impl Controls {
    pub fn new(config: SurfaceConfig) -> Self {
        Controls {
            config,
            width: 0.0,
            visibility: VisibilityState::default(),
            playing: false,
            click_enabled: true,
            vertical_swiping: false,
            horizontal_swiping: false,
            taps: TapState::default(),
            last_press: Point::ORIGIN,
            timers: Timers::default(),
            events: Vec::new(),
        }
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    pub fn taps(&self) -> &TapState {
        &self.taps
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn click_enabled(&self) -> bool {
        self.click_enabled
    }

    pub fn is_swiping(&self) -> bool {
        self.vertical_swiping || self.horizontal_swiping
    }

    /// Sets the surface width used to split the screen in halves.
    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Applies one input from the pointer tracker.
    pub fn handle(&mut self, input: Input) {
        match input {
            Input::Press(position, at) => self.press(position, at),
            Input::DragStart(Channel::Vertical, at) => self.vertical_drag_start(at),
            Input::DragStart(Channel::Horizontal, at) => self.horizontal_drag_start(at),
            Input::Drag(Channel::Vertical, position, delta) => {
                if self.horizontal_swiping {
                    return;
                }
                let swipe = gesture::classify_vertical(
                    position,
                    delta,
                    self.width,
                    self.config.swipe_threshold,
                );
                if let Some(swipe) = swipe {
                    log::debug!("vertical swipe {swipe:?}");
                    self.events.push(Event::Swipe(swipe));
                }
            }
            Input::Drag(Channel::Horizontal, _, delta) => {
                if self.vertical_swiping {
                    return;
                }
                if let Some(swipe) = gesture::classify_horizontal(delta, self.config.swipe_threshold)
                {
                    log::debug!("horizontal swipe {swipe:?}");
                    self.events.push(Event::Swipe(swipe));
                }
            }
            Input::DragEnd(Channel::Vertical, at) => {
                self.vertical_swiping = false;
                self.end_swipe(at);
            }
            Input::DragEnd(Channel::Horizontal, at) => {
                if std::mem::take(&mut self.horizontal_swiping) {
                    self.end_swipe(at);
                }
            }
        }
    }

    /// Records whether the engine is playing.
    pub fn set_playing(&mut self, playing: bool, at: Instant) {
        if self.playing != playing {
            self.playing = playing;
            self.restart_auto_hide(at);
        }
    }

    /// Fires every delayed action due at `now`.
    pub fn advance(&mut self, now: Instant) {
        while let Some((key, deadline)) = self.timers.pop_due(now) {
            log::trace!("{key:?} fired");
            match key {
                TimerKey::TapSettle => self.settle_taps(deadline),
                TimerKey::TapReset => {
                    self.taps.reset_offsets();
                    self.set_seek_overlay(false, deadline);
                }
                TimerKey::AutoHide => self.set_controls(false, deadline),
                TimerKey::OverlayHiddenNotice => {
                    self.events.push(Event::SeekOverlayVisibility(false));
                }
            }
        }
    }

    fn press(&mut self, position: Point, at: Instant) {
        self.last_press = position;
        if self.taps.press(at) {
            self.timers.cancel(TimerKey::TapReset);
            if self.taps.count != 1 {
                self.timers
                    .schedule(TimerKey::TapReset, at + self.config.swipe_controller_timeout);
            }
        }
        self.timers.schedule(TimerKey::TapSettle, at + TAP_SETTLE_DELAY);
    }

    fn settle_taps(&mut self, at: Instant) {
        match self.taps.count {
            0 => {}
            1 => {
                if self.click_enabled {
                    self.set_controls(!self.visibility.controls_visible, at);
                    self.events.push(Event::SingleTap);
                }
            }
            count => {
                self.set_controls(false, at);
                self.set_seek_overlay(true, at);

                let step = self.config.seek_step.as_millis() as u64;
                let half = ScreenHalf::of(self.last_press.x, self.width);
                let offset = self.taps.accumulate(half, step);
                log::debug!("{count} taps on the {half:?} half, offset {offset} ms");
                self.events.push(match half {
                    ScreenHalf::Right => Event::NextDoubleTap(offset),
                    ScreenHalf::Left => Event::PrevDoubleTap(offset),
                });
            }
        }
    }

    fn vertical_drag_start(&mut self, at: Instant) {
        self.begin_swipe(at);
        self.vertical_swiping = true;
    }

    fn horizontal_drag_start(&mut self, at: Instant) {
        if self.vertical_swiping {
            return;
        }
        self.begin_swipe(at);
        self.horizontal_swiping = true;
    }

    fn begin_swipe(&mut self, at: Instant) {
        self.set_controls(false, at);
        self.set_seek_overlay(true, at);
        self.click_enabled = false;
    }

    fn end_swipe(&mut self, at: Instant) {
        self.set_seek_overlay(false, at);
        self.set_controls(false, at);
        self.click_enabled = true;
    }

    fn set_controls(&mut self, visible: bool, at: Instant) {
        if self.visibility.controls_visible == visible {
            return;
        }
        self.visibility.controls_visible = visible;
        self.events.push(Event::ControlsVisibility(visible));
        self.restart_auto_hide(at);
    }

    fn restart_auto_hide(&mut self, at: Instant) {
        self.timers.cancel(TimerKey::AutoHide);
        if self.visibility.controls_visible && self.playing {
            self.timers
                .schedule(TimerKey::AutoHide, at + self.config.controller_visibility_time);
        }
    }

    fn set_seek_overlay(&mut self, visible: bool, at: Instant) {
        if self.visibility.seek_overlay_visible == visible {
            return;
        }
        self.visibility.seek_overlay_visible = visible;
        if visible {
            self.timers.cancel(TimerKey::OverlayHiddenNotice);
            self.events.push(Event::SeekOverlayVisibility(true));
        } else {
            self.timers.schedule(
                TimerKey::OverlayHiddenNotice,
                at + self.config.swipe_controller_timeout,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::Vector;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controls() -> Controls {
        let mut controls = Controls::new(SurfaceConfig::default());
        controls.set_width(400.0);
        controls
    }

    fn right() -> Point {
        Point::new(300.0, 100.0)
    }

    fn left() -> Point {
        Point::new(100.0, 100.0)
    }

    #[test]
    fn single_tap_shows_controls_after_settle() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::Press(right(), start));

        c.advance(start + ms(199));
        assert!(c.drain_events().is_empty());

        c.advance(start + ms(200));
        assert_eq!(
            c.drain_events(),
            vec![Event::ControlsVisibility(true), Event::SingleTap]
        );
        assert!(c.visibility().controls_visible);

        c.handle(Input::Press(right(), start + ms(1000)));
        c.advance(start + ms(1200));
        assert_eq!(
            c.drain_events(),
            vec![Event::ControlsVisibility(false), Event::SingleTap]
        );
    }

    #[test]
    fn double_tap_on_right_half_seeks_forward_once() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::Press(right(), start));
        c.handle(Input::Press(right(), start + ms(150)));
        c.advance(start + ms(350));

        assert_eq!(
            c.drain_events(),
            vec![Event::SeekOverlayVisibility(true), Event::NextDoubleTap(10_000)]
        );
        assert_eq!(c.taps().right_offset, 10_000);
        assert!(c.visibility().seek_overlay_visible);
        assert!(!c.visibility().controls_visible);
    }

    #[test]
    fn double_tap_on_left_half_seeks_backward() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::Press(left(), start));
        c.handle(Input::Press(left(), start + ms(100)));
        c.advance(start + ms(300));

        assert!(c.drain_events().contains(&Event::PrevDoubleTap(10_000)));
        assert_eq!(c.taps().left_offset, 10_000);
    }

    #[test]
    fn continued_tapping_keeps_accumulating() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::Press(right(), start));
        c.handle(Input::Press(right(), start + ms(100)));
        c.advance(start + ms(300));
        c.handle(Input::Press(right(), start + ms(350)));
        c.advance(start + ms(550));

        let events = c.drain_events();
        assert!(events.contains(&Event::NextDoubleTap(10_000)));
        assert!(events.contains(&Event::NextDoubleTap(20_000)));
    }

    #[test]
    fn multi_tap_settles_after_swipe_timeout() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::Press(right(), start));
        c.handle(Input::Press(right(), start + ms(100)));
        c.advance(start + ms(300));
        c.drain_events();

        // reset fires 600 ms after the count became 2
        c.advance(start + ms(699));
        assert!(c.visibility().seek_overlay_visible);
        c.advance(start + ms(700));
        assert!(!c.visibility().seek_overlay_visible);
        assert_eq!(c.taps().right_offset, 0);
        // the hidden notification is debounced by another timeout
        assert!(c.drain_events().is_empty());

        c.advance(start + ms(1300));
        assert_eq!(c.drain_events(), vec![Event::SeekOverlayVisibility(false)]);
    }

    #[test]
    fn auto_hide_while_playing() {
        let start = Instant::now();
        let mut c = controls();
        c.set_playing(true, start);
        c.handle(Input::Press(right(), start));
        c.advance(start + ms(200));
        assert_eq!(
            c.drain_events(),
            vec![Event::ControlsVisibility(true), Event::SingleTap]
        );

        c.advance(start + ms(3199));
        assert!(c.visibility().controls_visible);
        c.advance(start + ms(3200));
        assert!(!c.visibility().controls_visible);
        assert_eq!(c.drain_events(), vec![Event::ControlsVisibility(false)]);
    }

    #[test]
    fn no_auto_hide_while_paused() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::Press(right(), start));
        c.advance(start + ms(10_000));
        assert!(c.visibility().controls_visible);

        // playback starting restarts the countdown
        c.set_playing(true, start + ms(10_000));
        c.advance(start + ms(12_999));
        assert!(c.visibility().controls_visible);
        c.advance(start + ms(13_000));
        assert!(!c.visibility().controls_visible);
    }

    #[test]
    fn vertical_swipe_suppresses_controls_and_clicks() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::Press(left(), start));
        c.handle(Input::DragStart(Channel::Vertical, start + ms(50)));
        c.handle(Input::Drag(Channel::Vertical, left(), Vector::new(0.0, -30.0)));
        c.handle(Input::Drag(Channel::Vertical, left(), Vector::new(0.0, -30.0)));
        c.handle(Input::Drag(Channel::Vertical, left(), Vector::new(0.0, -5.0)));

        // the tap settles mid-drag and is swallowed
        c.advance(start + ms(200));
        assert!(!c.click_enabled());
        assert_eq!(
            c.drain_events(),
            vec![
                Event::SeekOverlayVisibility(true),
                Event::Swipe(Swipe::UpLeft),
                Event::Swipe(Swipe::UpLeft),
            ]
        );

        c.handle(Input::DragEnd(Channel::Vertical, start + ms(300)));
        assert!(c.click_enabled());
        assert!(!c.visibility().seek_overlay_visible);
        c.advance(start + ms(900));
        assert_eq!(c.drain_events(), vec![Event::SeekOverlayVisibility(false)]);
    }

    #[test]
    fn horizontal_drag_is_gated_by_vertical() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::DragStart(Channel::Vertical, start));
        c.handle(Input::DragStart(Channel::Horizontal, start));
        c.handle(Input::Drag(Channel::Horizontal, right(), Vector::new(40.0, 0.0)));
        c.handle(Input::DragEnd(Channel::Horizontal, start));

        assert!(c.is_swiping());
        assert_eq!(c.drain_events(), vec![Event::SeekOverlayVisibility(true)]);
    }

    #[test]
    fn horizontal_swipe_alone() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::DragStart(Channel::Horizontal, start));
        c.handle(Input::Drag(Channel::Horizontal, right(), Vector::new(-40.0, 0.0)));
        c.handle(Input::DragEnd(Channel::Horizontal, start + ms(100)));

        assert!(!c.is_swiping());
        assert!(c.click_enabled());
        assert_eq!(
            c.drain_events(),
            vec![
                Event::SeekOverlayVisibility(true),
                Event::Swipe(Swipe::Left),
            ]
        );
    }

    #[test]
    fn vertical_swipes_wait_for_horizontal_swipe_to_end() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::DragStart(Channel::Horizontal, start));
        c.handle(Input::DragStart(Channel::Vertical, start));
        c.handle(Input::Drag(Channel::Vertical, right(), Vector::new(0.0, 40.0)));
        assert!(!c
            .drain_events()
            .iter()
            .any(|event| matches!(event, Event::Swipe(_))));
    }

    #[test]
    fn overlay_reshown_before_notice_cancels_hidden_notification() {
        let start = Instant::now();
        let mut c = controls();
        c.handle(Input::DragStart(Channel::Vertical, start));
        c.handle(Input::DragEnd(Channel::Vertical, start + ms(100)));
        c.handle(Input::DragStart(Channel::Vertical, start + ms(200)));
        c.advance(start + ms(2000));

        assert_eq!(
            c.drain_events(),
            vec![
                Event::SeekOverlayVisibility(true),
                Event::SeekOverlayVisibility(true),
            ]
        );
    }
}
