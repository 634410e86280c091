use std::time::{Duration, Instant};

/// A single cancellable timer.
///
/// Scheduling again replaces the pending deadline, so only the last change
/// in a burst fires.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use cvwiz::application::Debouncer;
///
/// let mut debouncer = Debouncer::new(Duration::from_millis(300));
/// let start = Instant::now();
/// debouncer.schedule(start);
/// assert!(!debouncer.fire(start + Duration::from_millis(100)));
/// assert!(debouncer.fire(start + Duration::from_millis(300)));
/// assert!(!debouncer.is_pending());
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before the pending deadline, zero if it already passed.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Returns true exactly once when the deadline has been reached.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_moves_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        let start = Instant::now();
        debouncer.schedule(start);
        debouncer.schedule(start + Duration::from_millis(150));

        assert!(!debouncer.fire(start + Duration::from_millis(250)));
        assert!(debouncer.fire(start + Duration::from_millis(350)));
        assert!(!debouncer.fire(start + Duration::from_millis(400)));
    }

    #[test]
    fn test_cancel_discards_pending() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        let start = Instant::now();
        debouncer.schedule(start);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire(start + Duration::from_secs(1)));
        assert_eq!(debouncer.time_until(start), None);
    }

    #[test]
    fn test_time_until_saturates() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();
        debouncer.schedule(start);
        assert_eq!(debouncer.time_until(start), Some(Duration::from_millis(100)));
        assert_eq!(debouncer.time_until(start + Duration::from_secs(5)), Some(Duration::ZERO));
    }
}
