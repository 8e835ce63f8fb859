use agora_core::{ClearingEvent, Phase, Priority};

/// The slice of the discrete-event scheduler that markets are allowed to
/// touch: the current clock position plus the two ways of registering a
/// clearing callback.
pub trait PhaseScheduler {
    fn current_day(&self) -> u32;

    fn current_phase(&self) -> Phase;

    /// Run `event` at the next occurrence of `phase`: today if that phase
    /// has not started yet, otherwise tomorrow.
    fn schedule_soon(&mut self, phase: Phase, priority: Priority, event: ClearingEvent);

    /// Run `event` at `phase` tomorrow, regardless of today's progress.
    fn schedule_tomorrow(&mut self, phase: Phase, priority: Priority, event: ClearingEvent);
}
