use agora_core::{ClearingEvent, Phase, Priority};
use agora_ports::PhaseScheduler;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// An event popped from the queue, together with the clock coordinates it
/// fired at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent<E> {
    pub day: u32,
    pub phase: Phase,
    pub priority: Priority,
    pub event: E,
}

#[derive(Debug)]
struct Entry<E> {
    day: u32,
    phase: Phase,
    priority: Priority,
    /// Insertion counter, so same-slot events pop in submission order.
    seq: u64,
    event: E,
}

impl<E> Entry<E> {
    fn key(&self) -> (u32, Phase, Priority, u64) {
        (self.day, self.phase, self.priority, self.seq)
    }
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Priority queue of simulation events keyed by (day, phase, priority).
///
/// The queue owns the clock: `current_day`/`current_phase` report the
/// coordinates of the last event popped. Scheduling into a phase that has
/// already run today lands the event on the same phase tomorrow.
#[derive(Debug)]
pub struct EventQueue<E> {
    heap: BinaryHeap<Reverse<Entry<E>>>,
    day: u32,
    phase: Phase,
    next_seq: u64,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        EventQueue {
            heap: BinaryHeap::new(),
            day: 0,
            phase: Phase::Dawn,
            next_seq: 0,
        }
    }

    pub fn current_day(&self) -> u32 {
        self.day
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedule `event` at an explicit day.
    pub fn schedule_on(&mut self, day: u32, phase: Phase, priority: Priority, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            day,
            phase,
            priority,
            seq,
            event,
        }));
    }

    /// Schedule `event` at the next occurrence of `phase`: today if the
    /// clock has not passed that phase yet, otherwise tomorrow.
    pub fn schedule_soon(&mut self, phase: Phase, priority: Priority, event: E) {
        let day = if phase < self.phase { self.day + 1 } else { self.day };
        self.schedule_on(day, phase, priority, event);
    }

    /// Schedule `event` at `phase` tomorrow.
    pub fn schedule_tomorrow(&mut self, phase: Phase, priority: Priority, event: E) {
        self.schedule_on(self.day + 1, phase, priority, event);
    }

    /// Pop the next event and advance the clock to its coordinates.
    pub fn pop(&mut self) -> Option<ScheduledEvent<E>> {
        let Reverse(entry) = self.heap.pop()?;
        self.day = entry.day;
        self.phase = entry.phase;
        Some(ScheduledEvent {
            day: entry.day,
            phase: entry.phase,
            priority: entry.priority,
            event: entry.event,
        })
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: From<ClearingEvent>> PhaseScheduler for EventQueue<E> {
    fn current_day(&self) -> u32 {
        self.day
    }

    fn current_phase(&self) -> Phase {
        self.phase
    }

    fn schedule_soon(&mut self, phase: Phase, priority: Priority, event: ClearingEvent) {
        EventQueue::schedule_soon(self, phase, priority, E::from(event));
    }

    fn schedule_tomorrow(&mut self, phase: Phase, priority: Priority, event: ClearingEvent) {
        EventQueue::schedule_tomorrow(self, phase, priority, E::from(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_day_phase_priority_order() {
        let mut queue: EventQueue<&str> = EventQueue::new();
        queue.schedule_on(1, Phase::Dawn, Priority::Standard, "tomorrow-dawn");
        queue.schedule_on(0, Phase::Trade, Priority::Final, "trade-final");
        queue.schedule_on(0, Phase::Trade, Priority::Standard, "trade-standard");
        queue.schedule_on(0, Phase::Dawn, Priority::Standard, "dawn");

        assert_eq!(queue.pop().unwrap().event, "dawn");
        assert_eq!(queue.pop().unwrap().event, "trade-standard");
        assert_eq!(queue.pop().unwrap().event, "trade-final");
        assert_eq!(queue.pop().unwrap().event, "tomorrow-dawn");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn same_slot_events_are_fifo() {
        let mut queue: EventQueue<u32> = EventQueue::new();
        for i in 0..5 {
            queue.schedule_on(0, Phase::Trade, Priority::Standard, i);
        }
        for i in 0..5 {
            assert_eq!(queue.pop().unwrap().event, i);
        }
    }

    #[test]
    fn pop_advances_the_clock() {
        let mut queue: EventQueue<()> = EventQueue::new();
        assert_eq!(queue.current_day(), 0);
        assert_eq!(queue.current_phase(), Phase::Dawn);

        queue.schedule_on(2, Phase::Think, Priority::Standard, ());
        let fired = queue.pop().unwrap();
        assert_eq!(fired.day, 2);
        assert_eq!(queue.current_day(), 2);
        assert_eq!(queue.current_phase(), Phase::Think);
    }

    #[test]
    fn soon_lands_today_until_the_phase_passes() {
        let mut queue: EventQueue<&str> = EventQueue::new();
        queue.schedule_on(0, Phase::AdjustPrices, Priority::Standard, "advance");
        let _ = queue.pop();

        // Trade already ran today, so "soon" means tomorrow.
        queue.schedule_soon(Phase::Trade, Priority::Standard, "late");
        // Think has not run yet, so "soon" means today.
        queue.schedule_soon(Phase::Think, Priority::Standard, "in-time");

        let first = queue.pop().unwrap();
        assert_eq!(first.event, "in-time");
        assert_eq!(first.day, 0);
        let second = queue.pop().unwrap();
        assert_eq!(second.event, "late");
        assert_eq!(second.day, 1);
    }

    #[test]
    fn tomorrow_always_skips_today() {
        let mut queue: EventQueue<&str> = EventQueue::new();
        queue.schedule_tomorrow(Phase::Dawn, Priority::Standard, "next");
        let fired = queue.pop().unwrap();
        assert_eq!(fired.day, 1);
    }
}
