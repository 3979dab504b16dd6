//! Timing substrate for playback.
//!
//! The playback controller never sleeps or spawns anything itself. It asks a
//! [`Scheduler`] to deliver a [`TimerTicket`] after a delay and, when the
//! ticket comes back, hands it to `PlaybackController::on_timer`. Tickets
//! carry a generation number, so a delivery that was already queued when the
//! controller cancelled it is recognised as stale and dropped.

use std::time::{Duration, Instant};
use tracing::trace;

/// Handle for one scheduled advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerTicket(u64);

impl TimerTicket {
    pub(crate) fn new(generation: u64) -> Self {
        TimerTicket(generation)
    }

    pub fn generation(self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    /// Arrange for `ticket` to be delivered back after `delay`.
    fn schedule(&mut self, delay: Duration, ticket: TimerTicket);

    /// Forget `ticket`. Unknown or already-delivered tickets are ignored.
    fn cancel(&mut self, ticket: TimerTicket);
}

/// Deterministic scheduler driven by an explicit virtual clock.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    queue: Vec<(Duration, TimerTicket)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Delay remaining until the earliest queued ticket.
    pub fn next_delay(&self) -> Option<Duration> {
        self.queue
            .iter()
            .map(|(due, _)| due.saturating_sub(self.now))
            .min()
    }

    /// Advance the clock and return every ticket that came due, earliest
    /// first.
    pub fn advance_by(&mut self, elapsed: Duration) -> Vec<TimerTicket> {
        self.now += elapsed;
        let now = self.now;
        let mut due: Vec<(Duration, TimerTicket)> = Vec::new();
        self.queue.retain(|&(at, ticket)| {
            if at <= now {
                due.push((at, ticket));
                false
            } else {
                true
            }
        });
        due.sort();
        due.into_iter().map(|(_, ticket)| ticket).collect()
    }

    /// Jump straight to the earliest queued ticket and return it.
    pub fn fire_next(&mut self) -> Option<TimerTicket> {
        let delay = self.next_delay()?;
        self.advance_by(delay).into_iter().next()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, ticket: TimerTicket) {
        self.queue.push((self.now + delay, ticket));
    }

    fn cancel(&mut self, ticket: TimerTicket) {
        self.queue.retain(|&(_, queued)| queued != ticket);
    }
}

/// Wall-clock scheduler for a single-threaded polling loop.
///
/// Holds at most one deadline: scheduling replaces whatever was pending.
#[derive(Debug, Default)]
pub struct DeadlineScheduler {
    pending: Option<(Instant, TimerTicket)>,
}

impl DeadlineScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(at, _)| at)
    }

    /// Take the pending ticket if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<TimerTicket> {
        match self.pending {
            Some((at, ticket)) if at <= now => {
                self.pending = None;
                Some(ticket)
            }
            _ => None,
        }
    }
}

impl Scheduler for DeadlineScheduler {
    fn schedule(&mut self, delay: Duration, ticket: TimerTicket) {
        if let Some((_, replaced)) = self.pending {
            trace!(
                replaced = replaced.generation(),
                "Replacing pending deadline"
            );
        }
        self.pending = Some((Instant::now() + delay, ticket));
    }

    fn cancel(&mut self, ticket: TimerTicket) {
        if matches!(self.pending, Some((_, pending)) if pending == ticket) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_delivers_in_due_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Duration::from_millis(300), TimerTicket::new(1));
        scheduler.schedule(Duration::from_millis(100), TimerTicket::new(2));

        assert_eq!(scheduler.next_delay(), Some(Duration::from_millis(100)));
        assert!(scheduler.advance_by(Duration::from_millis(50)).is_empty());
        assert_eq!(
            scheduler.advance_by(Duration::from_millis(300)),
            vec![TimerTicket::new(2), TimerTicket::new(1)]
        );
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn manual_scheduler_cancel_removes_ticket() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule(Duration::ZERO, TimerTicket::new(7));
        scheduler.cancel(TimerTicket::new(7));
        assert_eq!(scheduler.fire_next(), None);
    }

    #[test]
    fn deadline_scheduler_polls_once() {
        let mut scheduler = DeadlineScheduler::new();
        scheduler.schedule(Duration::ZERO, TimerTicket::new(3));
        let later = Instant::now() + Duration::from_millis(1);
        assert_eq!(scheduler.poll(later), Some(TimerTicket::new(3)));
        assert_eq!(scheduler.poll(later), None);
    }

    #[test]
    fn deadline_scheduler_ignores_foreign_cancel() {
        let mut scheduler = DeadlineScheduler::new();
        scheduler.schedule(Duration::from_secs(60), TimerTicket::new(4));
        scheduler.cancel(TimerTicket::new(99));
        assert!(scheduler.deadline().is_some());
        scheduler.cancel(TimerTicket::new(4));
        assert!(scheduler.deadline().is_none());
    }
}
