//! The send pipeline shared by every leaf transport
//!
//! A backend only implements [`Deliver`]; wrapping it in a
//! [`PipelineTransport`] gives it envelope resolution, hooks, result
//! aggregation and throttling:
//!
//! ```text
//! clone message/envelope -> derive envelope if missing -> before_send hook
//!   -> no recipients? nothing sent
//!   -> fresh SendResult -> deliver -> after_send hook -> throttle
//! ```

use std::{fmt::Debug, sync::Arc};

use smsgate_common::{Envelope, Message, outgoing, tracing};

use crate::{
    clock::{Clock, SystemClock},
    error::{SendError, TransportError},
    hooks::{MessageHooks, NoHooks},
    result::SendResult,
    throttle::Throttle,
    transport::{SentMessage, Transport},
};

/// The backend-specific part of a send
pub trait Deliver: Send + Sync + Debug {
    /// Name of the backend as it would appear in a DSN
    fn name(&self) -> String;

    fn has_required_sender(&self) -> bool {
        true
    }

    /// Identity the [`SendResult`] of each send is bound to
    fn identity(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Hand the message to the backend, recording one outcome per recipient
    ///
    /// # Errors
    ///
    /// Any [`SendError`]; the pipeline propagates it unchanged.
    fn deliver(&self, sent: &mut SentMessage) -> Result<(), SendError>;
}

/// Runs a [`Deliver`] backend through the shared send pipeline
#[derive(Debug)]
pub struct PipelineTransport<D> {
    inner: D,
    hooks: Arc<dyn MessageHooks>,
    throttle: Throttle,
}

impl<D: Deliver> PipelineTransport<D> {
    /// Wrap `inner` with no hooks and throttling disabled
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            hooks: Arc::new(NoHooks),
            throttle: Throttle::new(0.0, Arc::new(SystemClock)),
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn MessageHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Use `clock` for throttling sleeps
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.throttle = Throttle::new(self.throttle.max_per_second(), clock);
        self
    }

    #[must_use]
    pub fn with_max_per_second(self, rate: f64) -> Self {
        self.throttle.set_max_per_second(rate);
        self
    }

    pub fn max_per_second(&self) -> f64 {
        self.throttle.max_per_second()
    }

    /// Change the rate limit of a live transport; see [`Throttle::set_max_per_second`]
    pub fn set_max_per_second(&self, rate: f64) {
        self.throttle.set_max_per_second(rate);
    }

    pub const fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Deliver> Transport for PipelineTransport<D> {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn has_required_sender(&self) -> bool {
        self.inner.has_required_sender()
    }

    fn send(
        &self,
        message: &Message,
        envelope: Option<&Envelope>,
    ) -> Result<Option<SentMessage>, SendError> {
        let message = message.clone();
        let envelope = match envelope {
            Some(envelope) => envelope.clone(),
            None => Envelope::deferred(&message).map_err(TransportError::InvalidEnvelope)?,
        };

        let (message, mut envelope) = self.hooks.before_send(message, envelope);
        envelope.track(&message);

        if envelope.recipients().is_empty() {
            tracing::debug!(
                transport = %self.inner.name(),
                "No recipients for message, nothing to send"
            );
            return Ok(None);
        }

        let mut sent = SentMessage::new(message, envelope, SendResult::new(self.inner.identity()));

        outgoing!(
            level = DEBUG,
            "Delivering {} message to {} recipient(s) via {}",
            sent.original().kind(),
            sent.envelope().recipients().len(),
            self.inner.name()
        );

        self.inner.deliver(&mut sent)?;
        self.hooks.after_send(&sent);
        self.throttle.wait();

        Ok(Some(sent))
    }
}
