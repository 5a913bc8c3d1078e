//! Entry point applications send messages through

use std::sync::Arc;

use smsgate_common::{Envelope, Message, outgoing};
use smsgate_transport::{SendError, SentMessage, Transport, TransportError};

/// Sends messages through a resolved transport tree
///
/// Checks the sender requirement up front, so a missing `From` is reported
/// before any backend is contacted.
#[derive(Debug, Clone)]
pub struct SmsSender {
    transport: Arc<dyn Transport>,
}

impl SmsSender {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn has_required_sender(&self) -> bool {
        self.transport.has_required_sender()
    }

    /// Send `message`, optionally overriding its addressing with `envelope`
    ///
    /// # Errors
    ///
    /// [`TransportError::MissingSender`] when the transport needs a sender and
    /// neither the message nor the envelope has one; otherwise whatever the
    /// transport returns.
    pub fn send(
        &self,
        message: &Message,
        envelope: Option<&Envelope>,
    ) -> Result<Option<SentMessage>, SendError> {
        if let Some(sms) = message.as_sms()
            && self.transport.has_required_sender()
            && sms.from_phone().is_none()
            && envelope.is_none_or(|envelope| envelope.from().is_err())
        {
            outgoing!(level = WARN, "Refusing to send an SMS without a sender");
            return Err(TransportError::MissingSender.into());
        }

        self.transport.send(message, envelope)
    }
}
