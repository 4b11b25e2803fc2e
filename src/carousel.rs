//! Infinitely looping banner carousel.
//!
//! The visible strip is the item list padded with a copy of the last item in
//! front and a copy of the first item at the back:
//!
//! ```text
//! visible index:  0      1      2    ...    N     N+1
//! slide:         [last] [first] [..] ... [last] [first]
//! ```
//!
//! Sliding onto a decoy (0 or N+1) animates like any other move; once the
//! transition has finished and one more transition period has passed, the
//! index snaps without animation to the real slide showing the same item
//! (N or 1). The viewer never sees the jump.
//!
//! The machine is either [`CarouselPhase::Idle`] or
//! [`CarouselPhase::Animating`]; manual moves and the auto-advance timer
//! share the animation lock. All delays are [`TimerQueue`] entries on the
//! caller's clock: call [`Carousel::advance`] with the current time to fire
//! whatever is due, and [`Carousel::dispose`] on teardown.

use log::{debug, info};

use crate::config::CarouselConfig;
use crate::timer::{FiredTimer, Millis, TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselPhase {
    Idle,
    Animating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselTimer {
    AnimationComplete,
    BoundaryCorrection,
    AutoAdvance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What happened while firing due timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselEvent {
    /// The auto-advance timer started a transition to `index`.
    AutoAdvanced { index: usize },
    /// The auto-advance timer fired but the carousel was busy or covered.
    AutoAdvanceSkipped,
    /// A transition finished; the carousel is idle at `index`.
    Settled { index: usize },
    /// The index jumped without animation from a decoy to its real slide.
    Snapped { from: usize, to: usize },
}

pub struct Carousel<T> {
    items: Vec<T>,
    config: CarouselConfig,
    index: usize,
    phase: CarouselPhase,
    overlay_open: bool,
    started: bool,
    disposed: bool,
    timers: TimerQueue<CarouselTimer>,
    animation_timer: Option<TimerId>,
    correction_timer: Option<TimerId>,
    auto_timer: Option<TimerId>,
}

impl<T> Carousel<T> {
    /// Zero timings are raised to one millisecond so every timer lands
    /// strictly in the future.
    pub fn new(items: Vec<T>, config: CarouselConfig) -> Self {
        let index = Self::home_index(items.len());
        let config = CarouselConfig {
            transition_ms: config.transition_ms.max(1),
            auto_advance_ms: config.auto_advance_ms.max(1),
        };
        Self {
            items,
            config,
            index,
            phase: CarouselPhase::Idle,
            overlay_open: false,
            started: false,
            disposed: false,
            timers: TimerQueue::new(),
            animation_timer: None,
            correction_timer: None,
            auto_timer: None,
        }
    }

    /// Looping with decoys needs at least two real items.
    fn home_index(len: usize) -> usize {
        if len >= 2 {
            1
        } else {
            0
        }
    }

    pub fn loops(&self) -> bool {
        self.items.len() >= 2
    }

    /// Number of real items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Length of the visible strip, decoys included.
    pub fn visible_len(&self) -> usize {
        if self.loops() {
            self.items.len() + 2
        } else {
            self.items.len()
        }
    }

    /// Visible index, always within `0..visible_len()`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position of the shown item in the real list.
    pub fn logical_index(&self) -> Option<usize> {
        match self.items.len() {
            0 => None,
            1 => Some(0),
            n => Some((self.index + n - 1) % n),
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.logical_index().and_then(|i| self.items.get(i))
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Slide at a visible index, resolving decoys to the item they copy.
    pub fn slide(&self, visible_index: usize) -> Option<&T> {
        let n = self.items.len();
        if !self.loops() {
            return self.items.get(visible_index);
        }
        match visible_index {
            0 => self.items.last(),
            i if i == n + 1 => self.items.first(),
            i if i <= n => self.items.get(i - 1),
            _ => None,
        }
    }

    /// The padded strip in display order.
    pub fn slides(&self) -> Vec<&T> {
        (0..self.visible_len()).filter_map(|i| self.slide(i)).collect()
    }

    pub fn phase(&self) -> CarouselPhase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        self.phase == CarouselPhase::Animating
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether a boundary correction is scheduled.
    pub fn correction_pending(&self) -> bool {
        self.correction_timer.is_some()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// When the caller should next call [`Carousel::advance`].
    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_deadline()
    }

    /// Starts the auto-advance timer.
    pub fn start(&mut self, now: Millis) {
        if self.disposed {
            return;
        }
        self.started = true;
        self.schedule_auto_advance(now);
    }

    /// Stops the auto-advance timer; manual navigation keeps working.
    pub fn stop(&mut self) {
        self.started = false;
        if let Some(id) = self.auto_timer.take() {
            self.timers.cancel(id);
        }
    }

    /// Marks an overlay (trailer modal) as shown or hidden. Auto-advance is
    /// suppressed while one is shown.
    pub fn set_overlay_open(&mut self, open: bool) {
        self.overlay_open = open;
    }

    pub fn overlay_open(&self) -> bool {
        self.overlay_open
    }

    /// Replaces the item list and returns to the first item, cancelling any
    /// transition in flight.
    pub fn set_items(&mut self, items: Vec<T>, now: Millis) {
        if self.disposed {
            return;
        }
        self.timers.cancel_all();
        self.animation_timer = None;
        self.correction_timer = None;
        self.auto_timer = None;
        self.phase = CarouselPhase::Idle;
        self.index = Self::home_index(items.len());
        self.items = items;
        debug!("Carousel reloaded with {} items", self.items.len());
        if self.started {
            self.schedule_auto_advance(now);
        }
    }

    /// Starts a transition to the next slide. Rejected (returns `false`)
    /// while animating, after disposal, or when there is nothing to loop.
    pub fn next(&mut self, now: Millis) -> bool {
        self.navigate(Direction::Forward, now)
    }

    pub fn previous(&mut self, now: Millis) -> bool {
        self.navigate(Direction::Backward, now)
    }

    pub fn navigate(&mut self, direction: Direction, now: Millis) -> bool {
        if self.disposed || !self.loops() {
            return false;
        }
        if self.phase == CarouselPhase::Animating {
            debug!("Carousel busy, ignoring {direction:?}");
            return false;
        }

        self.settle_pending_correction();
        self.index = match direction {
            Direction::Forward => self.index + 1,
            Direction::Backward => self.index - 1,
        };
        self.begin_transition(now);
        true
    }

    /// Starts a transition straight to the real slide of item
    /// `logical_index`. Rejected like [`Carousel::navigate`], and also for
    /// an index past the end or the item already shown.
    pub fn go_to(&mut self, logical_index: usize, now: Millis) -> bool {
        if self.disposed || !self.loops() || logical_index >= self.items.len() {
            return false;
        }
        if self.phase == CarouselPhase::Animating {
            debug!("Carousel busy, ignoring jump to {logical_index}");
            return false;
        }

        self.settle_pending_correction();
        let target = logical_index + 1;
        if target == self.index {
            return false;
        }
        self.index = target;
        self.begin_transition(now);
        true
    }

    /// A decoy must be left through its real slide, or the index would walk
    /// off the strip.
    fn settle_pending_correction(&mut self) {
        if let Some(id) = self.correction_timer.take() {
            self.timers.cancel(id);
            self.correct_boundary();
        }
    }

    fn begin_transition(&mut self, now: Millis) {
        self.phase = CarouselPhase::Animating;
        self.animation_timer = Some(
            self.timers
                .schedule(CarouselTimer::AnimationComplete, now + self.config.transition_ms),
        );
    }

    /// Fires every timer due at or before `now`, in deadline order.
    pub fn advance(&mut self, now: Millis) -> Vec<CarouselEvent> {
        let mut events = Vec::new();
        if self.disposed {
            return events;
        }
        while let Some(fired) = self.timers.pop_due(now) {
            if let Some(event) = self.fire(fired, now) {
                events.push(event);
            }
        }
        events
    }

    /// Cancels every pending timer. The carousel ignores all further input.
    pub fn dispose(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.animation_timer = None;
        self.correction_timer = None;
        self.auto_timer = None;
        self.started = false;
        self.disposed = true;
        info!("Carousel disposed, {cancelled} pending timers cancelled");
    }

    fn fire(&mut self, fired: FiredTimer<CarouselTimer>, now: Millis) -> Option<CarouselEvent> {
        match fired.kind {
            CarouselTimer::AnimationComplete => {
                self.animation_timer = None;
                self.phase = CarouselPhase::Idle;
                if self.on_decoy() {
                    self.correction_timer = Some(self.timers.schedule(
                        CarouselTimer::BoundaryCorrection,
                        fired.due + self.config.transition_ms,
                    ));
                }
                Some(CarouselEvent::Settled { index: self.index })
            }
            CarouselTimer::BoundaryCorrection => {
                self.correction_timer = None;
                self.correct_boundary()
            }
            CarouselTimer::AutoAdvance => {
                self.auto_timer = None;
                let mut next_due = fired.due + self.config.auto_advance_ms;
                if next_due <= now {
                    // Caller fell behind (suspended host); do not replay
                    // every missed tick.
                    next_due = now + self.config.auto_advance_ms;
                }
                self.auto_timer = Some(self.timers.schedule(CarouselTimer::AutoAdvance, next_due));

                if self.overlay_open || self.phase == CarouselPhase::Animating {
                    Some(CarouselEvent::AutoAdvanceSkipped)
                } else if self.navigate(Direction::Forward, fired.due) {
                    Some(CarouselEvent::AutoAdvanced { index: self.index })
                } else {
                    Some(CarouselEvent::AutoAdvanceSkipped)
                }
            }
        }
    }

    fn on_decoy(&self) -> bool {
        self.loops() && (self.index == 0 || self.index == self.items.len() + 1)
    }

    fn correct_boundary(&mut self) -> Option<CarouselEvent> {
        if !self.on_decoy() {
            return None;
        }
        let from = self.index;
        self.index = if from == 0 { self.items.len() } else { 1 };
        Some(CarouselEvent::Snapped { from, to: self.index })
    }

    fn schedule_auto_advance(&mut self, now: Millis) {
        if let Some(id) = self.auto_timer.take() {
            self.timers.cancel(id);
        }
        if self.loops() {
            self.auto_timer = Some(
                self.timers
                    .schedule(CarouselTimer::AutoAdvance, now + self.config.auto_advance_ms),
            );
        }
    }
}
