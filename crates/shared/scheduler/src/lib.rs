//! Agora Scheduler
//!
//! The discrete-event clock that drives a simulation: events are ordered
//! by day, then phase, then priority, and FIFO within the same slot.
//! Popping an event advances the clock to its coordinates; the clock never
//! moves backwards.

pub mod queue;

pub use queue::{EventQueue, ScheduledEvent};
