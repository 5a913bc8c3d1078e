//! Composite transports dispatching to a fixed list of members
//!
//! A [`Router`] tries one member at a time. A member whose send fails with a
//! [`TransportError`] is marked dead and the next one is tried, until a send
//! succeeds or no member is left. Dead members become eligible again once the
//! retry period has passed since they failed.
//!
//! Which member is tried next is decided by the [`Selection`] policy:
//!
//! - [`RoundRobin`] rotates through the members on every send
//! - [`Failover`] sticks to one member until it dies

mod failover;
mod round_robin;

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use ahash::AHashMap;
use parking_lot::Mutex;
use smsgate_common::{Envelope, Message, internal};

pub use self::{failover::Failover, round_robin::RoundRobin};
use crate::{
    clock::{Clock, SystemClock},
    error::{ResolveError, SendError, TransportError},
    transport::{SentMessage, Transport},
};

/// How long a dead member is skipped unless configured otherwise
pub const DEFAULT_RETRY_PERIOD: Duration = Duration::from_secs(60);

/// Rotates through its members on every send
pub type RoundRobinTransport = Router<RoundRobin>;

/// Sticks to one member until it fails
pub type FailoverTransport = Router<Failover>;

/// Bookkeeping shared by every selection policy
#[derive(Debug)]
pub struct Members {
    len: usize,
    cursor: usize,
    dead: AHashMap<usize, Instant>,
}

impl Members {
    fn new(len: usize) -> Self {
        Self {
            len,
            cursor: 0,
            dead: AHashMap::default(),
        }
    }

    pub fn is_dead(&self, index: usize) -> bool {
        self.dead.contains_key(&index)
    }

    /// The first live member at or after the cursor
    ///
    /// A dead member whose retry period has fully elapsed is resurrected and
    /// selected. The cursor moves past the selection; nothing is selected
    /// after a full loop over dead members.
    pub fn next_alive(&mut self, now: Instant, retry_period: Duration) -> Option<usize> {
        let start = self.cursor;
        let mut index = start;

        loop {
            let selected = match self.dead.get(&index).copied() {
                None => true,
                Some(died) if now.saturating_duration_since(died) > retry_period => {
                    self.dead.remove(&index);
                    internal!(level = DEBUG, "Retrying transport #{index} after its retry period");
                    true
                }
                Some(_) => false,
            };

            if selected {
                self.cursor = (index + 1) % self.len;
                return Some(index);
            }

            index = (index + 1) % self.len;
            if index == start {
                return None;
            }
        }
    }

    fn mark_dead(&mut self, index: usize, now: Instant) {
        self.dead.insert(index, now);
    }
}

/// Picks the member a router tries next
pub trait Selection: Default + Send + Debug {
    /// Type name used in configuration errors
    const NAME: &'static str;

    /// Joins member names in [`Transport::name`]
    const SEPARATOR: &'static str;

    fn select(
        &mut self,
        members: &mut Members,
        now: Instant,
        retry_period: Duration,
    ) -> Option<usize>;

    /// The member this policy currently sticks to, if any
    fn current(&self) -> Option<usize> {
        None
    }
}

/// Read-only snapshot of a router, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterState {
    /// Member index the next round-robin scan starts from
    pub cursor: usize,
    /// Indices of dead members, sorted
    pub dead: Vec<usize>,
    /// Member a failover router is sticking to
    pub current: Option<usize>,
}

#[derive(Debug)]
struct State<S> {
    members: Members,
    policy: S,
}

/// A transport made of other transports
#[derive(Debug)]
pub struct Router<S> {
    transports: Vec<Arc<dyn Transport>>,
    retry_period: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<State<S>>,
}

impl<S: Selection> Router<S> {
    /// Build a router over `transports`, tried in the given order
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoTransports`] if `transports` is empty.
    pub fn new(
        transports: Vec<Arc<dyn Transport>>,
        retry_period: Duration,
    ) -> Result<Self, ResolveError> {
        if transports.is_empty() {
            return Err(ResolveError::NoTransports(S::NAME));
        }

        Ok(Self {
            state: Mutex::new(State {
                members: Members::new(transports.len()),
                policy: S::default(),
            }),
            transports,
            retry_period,
            clock: Arc::new(SystemClock),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn transports(&self) -> &[Arc<dyn Transport>] {
        &self.transports
    }

    pub const fn retry_period(&self) -> Duration {
        self.retry_period
    }

    pub fn state(&self) -> RouterState {
        let state = self.state.lock();
        let mut dead = state.members.dead.keys().copied().collect::<Vec<_>>();
        dead.sort_unstable();

        RouterState {
            cursor: state.members.cursor,
            dead,
            current: state.policy.current(),
        }
    }

    fn next_transport(&self) -> Option<usize> {
        let mut state = self.state.lock();
        let State { members, policy } = &mut *state;
        policy.select(members, self.clock.now(), self.retry_period)
    }

    fn mark_dead(&self, index: usize) {
        self.state.lock().members.mark_dead(index, self.clock.now());
    }
}

impl<S: Selection> Transport for Router<S> {
    fn name(&self) -> String {
        self.transports
            .iter()
            .map(|transport| transport.name())
            .collect::<Vec<_>>()
            .join(S::SEPARATOR)
    }

    fn has_required_sender(&self) -> bool {
        self.transports
            .iter()
            .any(|transport| transport.has_required_sender())
    }

    fn send(
        &self,
        message: &Message,
        envelope: Option<&Envelope>,
    ) -> Result<Option<SentMessage>, SendError> {
        while let Some(index) = self.next_transport() {
            let transport = &self.transports[index];

            match transport.send(message, envelope) {
                Ok(sent) => return Ok(sent),
                Err(SendError::Transport(err)) => {
                    internal!(
                        level = WARN,
                        "Transport {} failed, marking it dead: {err}",
                        transport.name()
                    );
                    self.mark_dead(index);
                }
                Err(err) => return Err(err),
            }
        }

        internal!(level = ERROR, "No transport left in {}", self.name());
        Err(TransportError::AllTransportsFailed.into())
    }
}
