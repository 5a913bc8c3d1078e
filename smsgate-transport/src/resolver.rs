//! Turning a DSN string into a transport tree
//!
//! A DSN string is either a single DSN or several joined by an operator, with
//! whitespace required on both sides of the operator:
//!
//! - `a || b` builds a [`FailoverTransport`]
//! - `a && b` builds a [`RoundRobinTransport`]
//!
//! Failover is checked first and the operators don't nest. In
//! `a || b && c` the second segment, `b && c`, is parsed as one DSN and
//! rejected as malformed.

use std::{fmt::Debug, sync::Arc, time::Duration};

use ahash::AHashMap;
use smsgate_common::internal;

use crate::{
    Dsn,
    backends::{Inbox, MemoryTransportFactory, NullTransportFactory},
    clock::{Clock, SystemClock},
    error::ResolveError,
    factory::{FactoryContext, TransportFactory},
    router::{DEFAULT_RETRY_PERIOD, FailoverTransport, RoundRobinTransport},
    transport::Transport,
};

const FAILOVER: &str = "||";
const ROUND_ROBIN: &str = "&&";

/// Ordered registry of transport factories
#[derive(Debug)]
pub struct Transports {
    factories: Vec<Box<dyn TransportFactory>>,
    optional_backends: AHashMap<String, String>,
    retry_period: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for Transports {
    fn default() -> Self {
        Self::new()
    }
}

impl Transports {
    /// An empty registry; nothing resolves until a factory is registered
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            optional_backends: AHashMap::default(),
            retry_period: DEFAULT_RETRY_PERIOD,
            clock: Arc::new(SystemClock),
        }
    }

    /// The built-in `null` and `memory` backends, in that order
    #[must_use]
    pub fn with_defaults(context: &FactoryContext, inbox: Inbox) -> Self {
        Self::new()
            .with_clock(Arc::clone(&context.clock))
            .register(NullTransportFactory::new(context.clone()))
            .register(MemoryTransportFactory::new(context.clone(), inbox))
    }

    /// Append a factory; earlier factories take precedence
    #[must_use]
    pub fn register(mut self, factory: impl TransportFactory + 'static) -> Self {
        self.factories.push(Box::new(factory));
        self
    }

    /// Declare a backend that exists but is not part of this build
    ///
    /// Resolving `host` then suggests enabling `package` instead of
    /// reporting an unknown host.
    #[must_use]
    pub fn with_optional_backend(
        mut self,
        host: impl Into<String>,
        package: impl Into<String>,
    ) -> Self {
        self.optional_backends.insert(host.into(), package.into());
        self
    }

    /// How long routers skip a failed member
    #[must_use]
    pub const fn with_retry_period(mut self, retry_period: Duration) -> Self {
        self.retry_period = retry_period;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve a full DSN string, operators included
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`] raised while parsing or building one of the parts.
    pub fn from_string(&self, dsn: &str) -> Result<Arc<dyn Transport>, ResolveError> {
        let dsn = dsn.trim();

        let segments = split_operator(dsn, FAILOVER);
        if segments.len() > 1 {
            internal!(level = DEBUG, "Building failover transport over {} DSNs", segments.len());
            let transports = self.resolve_all(&segments)?;
            return Ok(Arc::new(
                FailoverTransport::new(transports, self.retry_period)?
                    .with_clock(Arc::clone(&self.clock)),
            ));
        }

        let segments = split_operator(dsn, ROUND_ROBIN);
        if segments.len() > 1 {
            internal!(level = DEBUG, "Building round-robin transport over {} DSNs", segments.len());
            let transports = self.resolve_all(&segments)?;
            return Ok(Arc::new(
                RoundRobinTransport::new(transports, self.retry_period)?
                    .with_clock(Arc::clone(&self.clock)),
            ));
        }

        self.from_dsn(&dsn.parse()?)
    }

    /// Resolve one DSN with the first factory that supports it
    ///
    /// # Errors
    ///
    /// [`ResolveError::UnsupportedHost`] if no factory supports it, or the
    /// error of the factory that does.
    pub fn from_dsn(&self, dsn: &Dsn) -> Result<Arc<dyn Transport>, ResolveError> {
        let Some(factory) = self.factories.iter().find(|factory| factory.supports(dsn)) else {
            return Err(ResolveError::UnsupportedHost {
                host: dsn.host().to_string(),
                package: self.optional_backends.get(dsn.host()).cloned(),
            });
        };

        internal!("Resolving {dsn} with {factory:?}");
        factory.create(dsn)
    }

    fn resolve_all(&self, segments: &[&str]) -> Result<Vec<Arc<dyn Transport>>, ResolveError> {
        segments
            .iter()
            .map(|segment| self.from_dsn(&segment.parse()?))
            .collect()
    }
}

/// Split on `operator` where it has whitespace on both sides
///
/// The whitespace around a split point is dropped.
fn split_operator<'a>(dsn: &'a str, operator: &str) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;

    for (at, _) in dsn.match_indices(operator) {
        if at < start {
            continue;
        }

        let before = &dsn[start..at];
        let after = &dsn[at + operator.len()..];

        if before.ends_with(char::is_whitespace) && after.starts_with(char::is_whitespace) {
            segments.push(before.trim_end());
            start = dsn.len() - after.trim_start().len();
        }
    }

    segments.push(&dsn[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split_operator() {
        assert_eq!(split_operator("a || b", "||"), vec!["a", "b"]);
        assert_eq!(split_operator("a  ||\tb || c", "||"), vec!["a", "b", "c"]);
        assert_eq!(split_operator("a||b", "||"), vec!["a||b"]);
        assert_eq!(split_operator("a || b && c", "||"), vec!["a", "b && c"]);
        assert_eq!(split_operator("a && b", "||"), vec!["a && b"]);
        assert_eq!(split_operator("a || || b", "||"), vec!["a", "|| b"]);
    }
}
