use std::time::{Duration, Instant};

use super::{Members, Selection};

/// Rotate through the live members, one send each
///
/// N consecutive successful sends over N live members visit every member
/// once, in list order, starting from the cursor.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobin;

impl Selection for RoundRobin {
    const NAME: &'static str = "RoundRobinTransport";
    const SEPARATOR: &'static str = " && ";

    fn select(
        &mut self,
        members: &mut Members,
        now: Instant,
        retry_period: Duration,
    ) -> Option<usize> {
        members.next_alive(now, retry_period)
    }
}
