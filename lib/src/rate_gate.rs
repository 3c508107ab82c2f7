//! Minimum-interval gate placed in front of every API request

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Interval the client uses when no gate is supplied
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

pub trait RateGate: Send + Sync {
    /// Block the calling thread until the next request slot opens
    fn wait(&self);
}

/// Opens one slot per `period`, like a ticker started when the gate is built.
///
/// Slots that nobody claimed are not banked: after a long pause the next caller
/// gets a slot immediately and the one after it waits a full period again.
#[derive(Debug)]
pub struct IntervalGate {
    period: Duration,
    next_slot: Mutex<Instant>,
}

impl IntervalGate {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_slot: Mutex::new(Instant::now() + period),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for IntervalGate {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl RateGate for IntervalGate {
    fn wait(&self) {
        // A poisoned lock only means another caller panicked mid-wait
        let mut next_slot = match self.next_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let now = Instant::now();
        if *next_slot > now {
            thread::sleep(*next_slot - now);
        }

        *next_slot = Instant::now().max(*next_slot) + self.period;
    }
}

/// Gate that never blocks
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

impl RateGate for OpenGate {
    fn wait(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_slot_opens_after_one_period() {
        let gate = IntervalGate::new(Duration::from_millis(40));
        let start = Instant::now();
        gate.wait();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_consecutive_waits_are_spaced() {
        let gate = IntervalGate::new(Duration::from_millis(30));
        gate.wait();
        let start = Instant::now();
        gate.wait();
        gate.wait();
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_idle_time_is_not_banked() {
        let gate = IntervalGate::new(Duration::from_millis(20));
        thread::sleep(Duration::from_millis(80));

        gate.wait();
        let start = Instant::now();
        gate.wait();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_open_gate_does_not_block() {
        let start = Instant::now();
        for _ in 0..100 {
            OpenGate.wait();
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_default_period() {
        assert_eq!(IntervalGate::default().period(), Duration::from_secs(1));
    }
}
