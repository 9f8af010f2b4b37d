//! Cooperative timers for a single-threaded engine.
//!
//! Nothing runs on its own: the owner advances the clock and pulls due timers
//! one at a time with [`Scheduler::pop_due`], so callbacks that schedule or
//! cancel timers see a consistent clock. Every timer is addressed by the
//! [`TimerId`] returned when it was scheduled.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<K> {
    id: TimerId,
    deadline: Duration,
    period: Option<Duration>,
    kind: K,
}

#[derive(Debug)]
pub struct Scheduler<K> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<K>>,
}

impl<K: Copy> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of live timers.
    pub fn active(&self) -> usize {
        self.entries.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn schedule_once(&mut self, delay: Duration, kind: K) -> TimerId {
        self.insert(delay, None, kind)
    }

    pub fn schedule_repeating(&mut self, period: Duration, kind: K) -> TimerId {
        // A zero period would fire forever within one advance.
        let period = period.max(Duration::from_millis(1));
        self.insert(period, Some(period), kind)
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, kind: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            deadline: self.now + delay,
            period,
            kind,
        });
        id
    }

    /// Returns true if the timer was still live.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Fires the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Repeating timers are rescheduled one period later.
    /// Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, K)> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= until)
            .min_by_key(|(_, e)| (e.deadline, e.id))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[pos];
        self.now = self.now.max(entry.deadline);
        let fired = (entry.id, entry.kind);
        match entry.period {
            Some(period) => entry.deadline += period,
            None => {
                self.entries.remove(pos);
            }
        }
        Some(fired)
    }

    /// Moves the clock forward without firing anything. Call after draining
    /// [`pop_due`](Self::pop_due) for the same instant.
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some((_, k)) = s.pop_due(until) {
            fired.push(k);
        }
        s.advance_to(until);
        fired
    }

    #[test]
    fn once_fires_once() {
        let mut s = Scheduler::new();
        s.schedule_once(ms(500), "done");
        assert!(drain(&mut s, ms(499)).is_empty());
        assert_eq!(drain(&mut s, ms(500)), vec!["done"]);
        assert!(drain(&mut s, ms(5000)).is_empty());
        assert_eq!(s.active(), 0);
    }

    #[test]
    fn repeating_fires_every_period() {
        let mut s = Scheduler::new();
        s.schedule_repeating(ms(100), "tick");
        assert_eq!(drain(&mut s, ms(350)).len(), 3);
        assert_eq!(drain(&mut s, ms(400)).len(), 1);
        assert_eq!(s.active(), 1);
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule_once(ms(300), "late");
        s.schedule_once(ms(100), "early");
        s.schedule_once(ms(100), "early-second");
        assert_eq!(drain(&mut s, ms(1000)), vec!["early", "early-second", "late"]);
    }

    #[test]
    fn cancel_removes_timer() {
        let mut s = Scheduler::new();
        let id = s.schedule_repeating(ms(100), "tick");
        assert!(s.is_scheduled(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(drain(&mut s, ms(1000)).is_empty());
    }

    #[test]
    fn clock_moves_to_each_deadline() {
        let mut s = Scheduler::new();
        s.schedule_once(ms(200), "a");
        let (_, _) = s.pop_due(ms(1000)).unwrap();
        assert_eq!(s.now(), ms(200));
        // Scheduled from inside a callback: relative to the fired deadline.
        s.schedule_once(ms(100), "b");
        assert_eq!(s.pop_due(ms(1000)).map(|(_, k)| k), Some("b"));
        assert_eq!(s.now(), ms(300));
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut s = Scheduler::new();
        s.schedule_repeating(Duration::ZERO, "spin");
        assert_eq!(drain(&mut s, ms(3)).len(), 3);
    }
}
