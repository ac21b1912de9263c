//! Pointer interpretation: taps, multi-taps and directional swipes.
//!
//! Raw pointer samples are split into three independent channels that all see
//! the same input: a tap channel fed on every press, and a vertical and a
//! horizontal drag channel that each start once the pointer has travelled past
//! [`TOUCH_SLOP`] on their axis. Both drag channels can run during the same
//! physical drag.

use crate::config::{MULTI_TAP_GAP, TOUCH_SLOP};
use iced::{Point, Vector};
use std::time::Instant;

/// A recognized swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Swipe {
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Left,
    Right,
}

/// Which half of the surface a point falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenHalf {
    Left,
    Right,
}

impl ScreenHalf {
    /// The exact middle belongs to the left half.
    pub fn of(x: f32, width: f32) -> Self {
        if x > width / 2.0 {
            ScreenHalf::Right
        } else {
            ScreenHalf::Left
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Down,
    Move,
    Up,
}

/// One pointer reading, in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: Point,
    pub at: Instant,
    pub phase: Phase,
}

impl PointerSample {
    pub fn new(phase: Phase, position: Point, at: Instant) -> Self {
        PointerSample {
            position,
            at,
            phase,
        }
    }

    pub fn half(&self, width: f32) -> ScreenHalf {
        ScreenHalf::of(self.position.x, width)
    }
}

/// Tap sequence bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapState {
    pub count: u32,
    pub last_tap: Option<Instant>,
    /// Accumulated forward seek of the current sequence, in milliseconds.
    pub right_offset: u64,
    /// Accumulated backward seek of the current sequence, in milliseconds.
    pub left_offset: u64,
}

impl TapState {
    /// Counts a press at `at`. Returns whether the tap count changed.
    pub fn press(&mut self, at: Instant) -> bool {
        let previous = self.count;
        self.count = match self.last_tap {
            Some(last) if at.saturating_duration_since(last) <= MULTI_TAP_GAP => self.count + 1,
            _ => 1,
        };
        self.last_tap = Some(at);
        self.count != previous
    }

    /// Adds `step` to the accumulator of `half` and returns its new value.
    pub fn accumulate(&mut self, half: ScreenHalf, step: u64) -> u64 {
        let offset = match half {
            ScreenHalf::Right => &mut self.right_offset,
            ScreenHalf::Left => &mut self.left_offset,
        };
        *offset += step;
        *offset
    }

    pub fn reset_offsets(&mut self) {
        self.right_offset = 0;
        self.left_offset = 0;
    }
}

/// Classifies one vertical-channel drag delta.
///
/// Fires when either axis of `delta` exceeds `threshold`; the direction comes
/// from the sign of the vertical delta and the side from the half `position` is in.
pub fn classify_vertical(
    position: Point,
    delta: Vector,
    width: f32,
    threshold: f32,
) -> Option<Swipe> {
    if delta.x.abs() <= threshold && delta.y.abs() <= threshold {
        return None;
    }
    let up = delta.y < 0.0;
    Some(match (up, ScreenHalf::of(position.x, width)) {
        (true, ScreenHalf::Left) => Swipe::UpLeft,
        (true, ScreenHalf::Right) => Swipe::UpRight,
        (false, ScreenHalf::Left) => Swipe::DownLeft,
        (false, ScreenHalf::Right) => Swipe::DownRight,
    })
}

/// Classifies one horizontal-channel drag delta.
pub fn classify_horizontal(delta: Vector, threshold: f32) -> Option<Swipe> {
    if delta.x.abs() <= threshold {
        None
    } else if delta.x < 0.0 {
        Some(Swipe::Left)
    } else {
        Some(Swipe::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Vertical,
    Horizontal,
}

/// Input for the gesture state machine, produced by [`PointerTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Press(Point, Instant),
    DragStart(Channel, Instant),
    Drag(Channel, Point, Vector),
    DragEnd(Channel, Instant),
}

/// Splits a raw pointer stream into tap and drag channel inputs.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    origin: Option<Point>,
    last: Point,
    vertical: bool,
    horizontal: bool,
}

impl PointerTracker {
    pub fn is_pressed(&self) -> bool {
        self.origin.is_some()
    }

    pub fn track(&mut self, sample: PointerSample) -> Vec<Input> {
        let mut inputs = Vec::new();

        match sample.phase {
            Phase::Down => {
                // a press without a release (e.g. lost pointer) ends the previous drags
                self.finish(sample.at, &mut inputs);
                self.origin = Some(sample.position);
                self.last = sample.position;
                inputs.push(Input::Press(sample.position, sample.at));
            }
            Phase::Move => {
                let Some(origin) = self.origin else {
                    return inputs;
                };
                let travelled = sample.position - origin;
                let delta = sample.position - self.last;

                if !self.vertical && travelled.y.abs() > TOUCH_SLOP {
                    self.vertical = true;
                    inputs.push(Input::DragStart(Channel::Vertical, sample.at));
                }
                if !self.horizontal && travelled.x.abs() > TOUCH_SLOP {
                    self.horizontal = true;
                    inputs.push(Input::DragStart(Channel::Horizontal, sample.at));
                }
                if self.vertical {
                    inputs.push(Input::Drag(Channel::Vertical, sample.position, delta));
                }
                if self.horizontal {
                    inputs.push(Input::Drag(Channel::Horizontal, sample.position, delta));
                }
                self.last = sample.position;
            }
            Phase::Up => self.finish(sample.at, &mut inputs),
        }

        inputs
    }

    fn finish(&mut self, at: Instant, inputs: &mut Vec<Input>) {
        if std::mem::take(&mut self.vertical) {
            inputs.push(Input::DragEnd(Channel::Vertical, at));
        }
        if std::mem::take(&mut self.horizontal) {
            inputs.push(Input::DragEnd(Channel::Horizontal, at));
        }
        self.origin = None;
    }
}
