//! Word-by-word playback state machine.
//!
//! The controller owns the reading position and the pace ramp. Timing is
//! delegated to a [`Scheduler`]: every transition out of `Playing` cancels
//! the single pending ticket, and `on_timer` refuses any ticket other than
//! the one it is currently waiting for.

use crate::scheduler::{Scheduler, TimerTicket};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Slowest selectable target pace (words per minute).
pub const MIN_TARGET_PACE: u32 = 100;
/// Fastest selectable target pace (words per minute).
pub const MAX_TARGET_PACE: u32 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No document loaded.
    #[default]
    Idle,
    Ready,
    Playing,
    Paused,
    /// Every word has been shown.
    Finished,
}

/// Gradual acceleration applied whenever playback (re)starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaceRamp {
    pub floor: u32,
    pub step: u32,
}

impl Default for PaceRamp {
    fn default() -> Self {
        PaceRamp {
            floor: 100,
            step: 25,
        }
    }
}

/// What a delivered timer produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// Index of the word to display.
    pub index: usize,
    /// Effective pace used to time the gap after this word.
    pub pace: u32,
    pub delay: Duration,
    pub finished: bool,
}

pub fn clamp_target_pace(wpm: u32) -> u32 {
    wpm.clamp(MIN_TARGET_PACE, MAX_TARGET_PACE)
}

/// Gap between two words at `pace` words per minute.
pub fn delay_for_pace(pace: u32) -> Duration {
    Duration::from_millis(60_000 / u64::from(pace.max(1)))
}

#[derive(Debug)]
pub struct PlaybackController<S: Scheduler> {
    scheduler: S,
    state: PlaybackState,
    len: usize,
    current_index: usize,
    target_pace: u32,
    ramp_pace: u32,
    ramp: PaceRamp,
    pending: Option<TimerTicket>,
    generation: u64,
}

impl<S: Scheduler> PlaybackController<S> {
    pub fn new(scheduler: S, target_pace: u32, ramp: PaceRamp) -> Self {
        let target_pace = clamp_target_pace(target_pace);
        Self {
            scheduler,
            state: PlaybackState::Idle,
            len: 0,
            current_index: 0,
            target_pace,
            ramp_pace: ramp.floor.min(target_pace),
            ramp,
            pending: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn target_pace(&self) -> u32 {
        self.target_pace
    }

    /// Pace the ramp will use for the next displayed word.
    pub fn ramp_pace(&self) -> u32 {
        self.ramp_pace
    }

    pub fn ramp(&self) -> PaceRamp {
        self.ramp
    }

    pub fn pending_ticket(&self) -> Option<TimerTicket> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Install a document of `len` words, positioned at `resume_index`
    /// (clamped to the last word).
    pub fn load(&mut self, len: usize, resume_index: usize) {
        self.cancel_pending();
        self.len = len;
        self.current_index = if len == 0 {
            0
        } else {
            resume_index.min(len - 1)
        };
        self.ramp_pace = self.ramp_floor();
        self.state = if len == 0 {
            PlaybackState::Idle
        } else {
            PlaybackState::Ready
        };
        debug!(
            words = len,
            index = self.current_index,
            "Playback loaded document"
        );
    }

    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Idle => {
                debug!("Toggle ignored: no document loaded");
            }
            PlaybackState::Playing => self.pause(),
            PlaybackState::Finished => {
                self.current_index = 0;
                self.start();
            }
            PlaybackState::Ready | PlaybackState::Paused => self.start(),
        }
    }

    /// Suspend playback (navigation does this before repositioning).
    pub fn pause(&mut self) {
        self.cancel_pending();
        if matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Finished
        ) {
            self.state = PlaybackState::Paused;
            debug!(index = self.current_index, "Playback paused");
        }
    }

    pub fn reset(&mut self) {
        self.cancel_pending();
        self.current_index = 0;
        self.ramp_pace = self.target_pace;
        self.state = if self.len == 0 {
            PlaybackState::Idle
        } else {
            PlaybackState::Ready
        };
        debug!(state = ?self.state, "Playback reset");
    }

    /// Move the reading position. Does not change the playing state; callers
    /// pause first.
    pub fn seek(&mut self, index: usize) {
        if self.len == 0 {
            return;
        }
        self.current_index = index.min(self.len);
        if self.state == PlaybackState::Finished && self.current_index < self.len {
            self.state = PlaybackState::Paused;
        }
    }

    /// Change the target pace, returning the clamped value actually applied.
    pub fn set_target_pace(&mut self, wpm: u32) -> u32 {
        let clamped = clamp_target_pace(wpm);
        self.target_pace = clamped;
        if self.is_playing() {
            // Pending schedule stays; the next delay picks this up.
            self.ramp_pace = self.ramp_pace.min(clamped);
        } else {
            self.ramp_pace = self.ramp_floor();
        }
        debug!(target = clamped, ramp = self.ramp_pace, "Target pace changed");
        clamped
    }

    /// Deliver a scheduled advance. Stale tickets return `None` and change
    /// nothing.
    pub fn on_timer(&mut self, ticket: TimerTicket) -> Option<Advance> {
        if self.pending != Some(ticket) {
            trace!(
                ticket = ticket.generation(),
                pending = ?self.pending.map(TimerTicket::generation),
                "Ignoring stale playback timer"
            );
            return None;
        }
        self.pending = None;
        if !self.is_playing() {
            return None;
        }
        if self.current_index >= self.len {
            self.state = PlaybackState::Finished;
            return None;
        }

        let index = self.current_index;
        self.current_index += 1;
        let pace = self.ramp_pace.max(1);
        let delay = delay_for_pace(pace);
        self.ramp_pace = self
            .ramp_pace
            .saturating_add(self.ramp.step)
            .min(self.target_pace);

        let finished = self.current_index >= self.len;
        if finished {
            self.state = PlaybackState::Finished;
            debug!(words = self.len, "Playback finished");
        } else {
            self.schedule_next(delay);
        }
        Some(Advance {
            index,
            pace,
            delay,
            finished,
        })
    }

    fn start(&mut self) {
        if self.current_index >= self.len {
            self.current_index = 0;
        }
        self.state = PlaybackState::Playing;
        self.ramp_pace = self.ramp_floor();
        self.cancel_pending();
        self.schedule_next(Duration::ZERO);
        debug!(
            index = self.current_index,
            ramp = self.ramp_pace,
            target = self.target_pace,
            "Playback started"
        );
    }

    fn ramp_floor(&self) -> u32 {
        self.ramp.floor.min(self.target_pace).max(1)
    }

    fn schedule_next(&mut self, delay: Duration) {
        self.cancel_pending();
        self.generation = self.generation.wrapping_add(1);
        let ticket = TimerTicket::new(self.generation);
        self.pending = Some(ticket);
        self.scheduler.schedule(delay, ticket);
    }

    fn cancel_pending(&mut self) {
        if let Some(ticket) = self.pending.take() {
            self.scheduler.cancel(ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    fn controller(len: usize, target: u32) -> PlaybackController<ManualScheduler> {
        let mut controller =
            PlaybackController::new(ManualScheduler::new(), target, PaceRamp::default());
        controller.load(len, 0);
        controller
    }

    fn fire(controller: &mut PlaybackController<ManualScheduler>) -> Option<Advance> {
        let ticket = controller.scheduler_mut().fire_next()?;
        controller.on_timer(ticket)
    }

    #[test]
    fn ramp_climbs_from_floor_to_target() {
        let mut controller = controller(20, 300);
        controller.toggle();

        let paces: Vec<u32> = (0..12)
            .map(|_| fire(&mut controller).expect("word").pace)
            .collect();

        assert_eq!(
            paces,
            vec![100, 125, 150, 175, 200, 225, 250, 275, 300, 300, 300, 300]
        );
        assert_eq!(controller.current_index(), 12);
    }

    #[test]
    fn delay_is_sixty_thousand_over_pace() {
        let mut controller = controller(5, 300);
        controller.toggle();
        let first = fire(&mut controller).unwrap();
        assert_eq!(first.delay, Duration::from_millis(600));
        assert_eq!(
            controller.scheduler().next_delay(),
            Some(Duration::from_millis(600))
        );
        let second = fire(&mut controller).unwrap();
        assert_eq!(second.delay, Duration::from_millis(480));
    }

    #[test]
    fn floor_above_target_starts_at_target() {
        let mut controller = PlaybackController::new(
            ManualScheduler::new(),
            150,
            PaceRamp {
                floor: 200,
                step: 25,
            },
        );
        controller.load(3, 0);
        controller.toggle();
        assert_eq!(fire(&mut controller).unwrap().pace, 150);
        assert_eq!(fire(&mut controller).unwrap().pace, 150);
    }

    #[test]
    fn pause_cancels_pending_and_stale_ticket_is_ignored() {
        let mut controller = controller(10, 300);
        controller.toggle();
        let stale = controller.pending_ticket().unwrap();

        controller.toggle();
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.scheduler().pending_count(), 0);

        // Restart within the same tick; the old ticket must not fire.
        controller.toggle();
        assert_eq!(controller.on_timer(stale), None);
        assert_eq!(controller.current_index(), 0);
        assert_eq!(controller.scheduler().pending_count(), 1);
    }

    #[test]
    fn at_most_one_pending_timer() {
        let mut controller = controller(50, 1000);
        controller.toggle();
        for _ in 0..20 {
            assert!(controller.scheduler().pending_count() <= 1);
            fire(&mut controller);
        }
        controller.toggle();
        controller.toggle();
        controller.toggle();
        controller.toggle();
        assert!(controller.scheduler().pending_count() <= 1);
    }

    #[test]
    fn reaching_the_end_finishes_and_stops_scheduling() {
        let mut controller = controller(3, 500);
        controller.toggle();
        let indices: Vec<usize> = std::iter::from_fn(|| fire(&mut controller))
            .map(|advance| advance.index)
            .collect();

        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(controller.state(), PlaybackState::Finished);
        assert_eq!(controller.current_index(), 3);
        assert_eq!(controller.scheduler().pending_count(), 0);
    }

    #[test]
    fn toggle_from_finished_restarts_at_zero() {
        let mut controller = controller(2, 500);
        controller.toggle();
        while fire(&mut controller).is_some() {}
        assert_eq!(controller.state(), PlaybackState::Finished);

        controller.toggle();

        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(fire(&mut controller).unwrap().index, 0);
    }

    #[test]
    fn reset_returns_to_ready_at_zero() {
        let mut controller = controller(10, 300);
        controller.toggle();
        fire(&mut controller);
        fire(&mut controller);

        controller.reset();

        assert_eq!(controller.state(), PlaybackState::Ready);
        assert_eq!(controller.current_index(), 0);
        assert_eq!(controller.scheduler().pending_count(), 0);
        assert_eq!(controller.pending_ticket(), None);
    }

    #[test]
    fn reset_without_document_is_idle() {
        let mut controller =
            PlaybackController::new(ManualScheduler::new(), 300, PaceRamp::default());
        controller.reset();
        assert_eq!(controller.state(), PlaybackState::Idle);
        controller.toggle();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(controller.scheduler().pending_count(), 0);
    }

    #[test]
    fn load_clamps_resume_index_and_cancels_pending() {
        let mut controller = controller(10, 300);
        controller.toggle();
        controller.load(4, 37);
        assert_eq!(controller.state(), PlaybackState::Ready);
        assert_eq!(controller.current_index(), 3);
        assert_eq!(controller.scheduler().pending_count(), 0);
    }

    #[test]
    fn target_change_while_paused_resets_ramp_to_floor() {
        let mut controller = controller(30, 600);
        controller.toggle();
        for _ in 0..6 {
            fire(&mut controller);
        }
        controller.toggle();
        assert!(controller.ramp_pace() > 100);

        assert_eq!(controller.set_target_pace(50), MIN_TARGET_PACE);
        assert_eq!(controller.ramp_pace(), 100);
        assert_eq!(controller.set_target_pace(5000), MAX_TARGET_PACE);
        assert_eq!(controller.ramp_pace(), 100);
    }

    #[test]
    fn target_change_while_playing_keeps_schedule_and_caps_next_delay() {
        let mut controller = controller(30, 1000);
        controller.toggle();
        for _ in 0..10 {
            fire(&mut controller);
        }
        let pending = controller.pending_ticket();
        assert_eq!(controller.ramp_pace(), 350);

        controller.set_target_pace(200);

        assert_eq!(controller.pending_ticket(), pending);
        assert_eq!(controller.scheduler().pending_count(), 1);
        let next = fire(&mut controller).unwrap();
        assert_eq!(next.pace, 200);
        assert_eq!(next.delay, Duration::from_millis(300));
    }

    #[test]
    fn pause_then_seek_from_finished_is_paused() {
        let mut controller = controller(2, 500);
        controller.toggle();
        while fire(&mut controller).is_some() {}

        controller.pause();
        controller.seek(0);

        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.current_index(), 0);
    }
}
