//! The transport contract and the record of a completed send

use std::fmt::Debug;

use smsgate_common::{Envelope, Message, RawMessage};

use crate::{error::SendError, result::SendResult};

/// Something able to deliver a message to its recipients
///
/// Leaf backends, routers and the resolver output all implement this, so a
/// caller never needs to know whether it talks to one backend or a tree of
/// them. Implementations are shared across threads as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync + Debug {
    /// Human readable name, as it would appear in a DSN string
    fn name(&self) -> String;

    /// Whether the caller must provide a sender for this transport
    fn has_required_sender(&self) -> bool {
        true
    }

    /// Deliver `message`
    ///
    /// Without an `envelope`, sender and recipients are read from the
    /// message itself. Returns `Ok(None)` when there was nobody to send to.
    ///
    /// # Errors
    ///
    /// [`SendError::Transport`] when delivery failed in a way another
    /// transport might not, [`SendError::Fatal`] otherwise.
    fn send(
        &self,
        message: &Message,
        envelope: Option<&Envelope>,
    ) -> Result<Option<SentMessage>, SendError>;
}

/// A message that went through a transport, with its per-recipient outcome
#[derive(Debug, Clone)]
pub struct SentMessage {
    original: Message,
    raw: RawMessage,
    envelope: Envelope,
    result: SendResult,
}

impl SentMessage {
    #[must_use]
    pub fn new(message: Message, envelope: Envelope, result: SendResult) -> Self {
        Self {
            raw: message.to_raw(),
            original: message,
            envelope,
            result,
        }
    }

    #[must_use]
    pub const fn original(&self) -> &Message {
        &self.original
    }

    #[must_use]
    pub const fn raw(&self) -> &RawMessage {
        &self.raw
    }

    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    #[must_use]
    pub const fn result(&self) -> &SendResult {
        &self.result
    }

    pub const fn result_mut(&mut self) -> &mut SendResult {
        &mut self.result
    }

    /// Borrow the message and envelope while the result is being filled
    pub const fn parts_mut(&mut self) -> (&Message, &Envelope, &mut SendResult) {
        (&self.original, &self.envelope, &mut self.result)
    }

    #[must_use]
    pub fn into_result(self) -> SendResult {
        self.result
    }
}
