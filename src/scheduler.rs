/// Decides when the next poll is due.
///
/// Holds no measurement logic: it only spaces poll requests `interval_ms`
/// apart on the driver's clock. The first poll is due immediately. A late tick
/// schedules the next poll one interval after the tick that ran, so a stalled
/// host never triggers a burst of catch-up polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollingScheduler {
    interval_ms: u32,
    next_due_ms: Option<u64>,
}

impl PollingScheduler {
    /// Creates a scheduler with the given interval.
    #[must_use]
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            next_due_ms: None,
        }
    }

    /// Interval between polls in milliseconds.
    #[must_use]
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Changes the interval. The pending due time is kept.
    pub fn set_interval_ms(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    /// Returns `true` and books the next slot if a poll is due at `now_ms`.
    pub fn poll_due(&mut self, now_ms: u64) -> bool {
        match self.next_due_ms {
            Some(due) if now_ms < due => false,
            _ => {
                self.next_due_ms = Some(now_ms.saturating_add(u64::from(self.interval_ms)));
                true
            }
        }
    }

    /// Milliseconds until the next poll is due, zero if it is due already.
    #[must_use]
    pub fn ms_until_due(&self, now_ms: u64) -> u64 {
        self.next_due_ms
            .map_or(0, |due| due.saturating_sub(now_ms))
    }

    /// Forgets the booked slot so the next tick polls immediately.
    pub fn reset(&mut self) {
        self.next_due_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_polls_immediately() {
        let mut scheduler = PollingScheduler::new(60_000);
        assert_eq!(scheduler.ms_until_due(5), 0);
        assert!(scheduler.poll_due(5));
        assert!(!scheduler.poll_due(6));
        assert_eq!(scheduler.ms_until_due(6), 59_999);
    }

    #[test]
    fn polls_are_spaced_by_the_interval() {
        let mut scheduler = PollingScheduler::new(100);
        assert!(scheduler.poll_due(0));
        assert!(!scheduler.poll_due(99));
        assert!(scheduler.poll_due(100));
        assert!(!scheduler.poll_due(150));
        assert!(scheduler.poll_due(200));
    }

    #[test]
    fn late_ticks_do_not_burst() {
        let mut scheduler = PollingScheduler::new(100);
        assert!(scheduler.poll_due(0));
        assert!(scheduler.poll_due(1_000));
        assert!(!scheduler.poll_due(1_050));
        assert_eq!(scheduler.ms_until_due(1_050), 50);
    }

    #[test]
    fn reset_makes_the_next_tick_due() {
        let mut scheduler = PollingScheduler::new(100);
        assert!(scheduler.poll_due(0));
        scheduler.reset();
        assert!(scheduler.poll_due(1));
    }
}
