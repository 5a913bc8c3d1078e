use std::time::{Duration, Instant};

use super::{Members, Selection};

/// Stay on the current member while it is alive
///
/// When the current member dies, the next one is picked the way
/// [`RoundRobin`](super::RoundRobin) would and becomes the new current.
#[derive(Debug, Default, Clone, Copy)]
pub struct Failover {
    current: Option<usize>,
}

impl Selection for Failover {
    const NAME: &'static str = "FailoverTransport";
    const SEPARATOR: &'static str = " || ";

    fn select(
        &mut self,
        members: &mut Members,
        now: Instant,
        retry_period: Duration,
    ) -> Option<usize> {
        match self.current {
            Some(current) if !members.is_dead(current) => Some(current),
            _ => {
                self.current = members.next_alive(now, retry_period);
                self.current
            }
        }
    }

    fn current(&self) -> Option<usize> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETRY: Duration = Duration::from_secs(60);

    #[test]
    fn test_sticks_to_current() {
        let now = Instant::now();
        let mut members = Members::new(3);
        let mut policy = Failover::default();

        for _ in 0..5 {
            assert_eq!(policy.select(&mut members, now, RETRY), Some(0));
        }
        assert_eq!(policy.current(), Some(0));
    }

    #[test]
    fn test_moves_on_when_current_dies() {
        let now = Instant::now();
        let mut members = Members::new(3);
        let mut policy = Failover::default();

        assert_eq!(policy.select(&mut members, now, RETRY), Some(0));
        members.mark_dead(0, now);

        assert_eq!(policy.select(&mut members, now, RETRY), Some(1));
        assert_eq!(policy.select(&mut members, now, RETRY), Some(1));
    }

    #[test]
    fn test_forgets_current_when_all_dead() {
        let now = Instant::now();
        let mut members = Members::new(1);
        let mut policy = Failover::default();

        assert_eq!(policy.select(&mut members, now, RETRY), Some(0));
        members.mark_dead(0, now);

        assert_eq!(policy.select(&mut members, now, RETRY), None);
        assert_eq!(policy.current(), None);
    }
}
