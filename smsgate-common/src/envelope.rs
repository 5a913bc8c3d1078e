//! Sender and recipients of a single send
//!
//! An [`Envelope`] is either given explicitly by the caller or deferred: a
//! [`DeferredEnvelope`] reads the `From` and `To` fields of the structured
//! message the first time they are needed, unless they were overridden first.

use crate::{
    error::EnvelopeError,
    message::{Message, Sms},
    phone::Phone,
};

/// An explicitly provided sender and recipient list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsEnvelope {
    from: Phone,
    recipients: Vec<Phone>,
}

impl SmsEnvelope {
    #[must_use]
    pub const fn new(from: Phone, recipients: Vec<Phone>) -> Self {
        Self { from, recipients }
    }
}

/// An envelope resolved lazily from the message headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredEnvelope {
    sms: Sms,
    from: Option<Phone>,
    recipients: Option<Vec<Phone>>,
}

impl DeferredEnvelope {
    /// Build a deferred envelope for `message`
    ///
    /// # Errors
    ///
    /// Fails immediately with [`EnvelopeError::NotStructured`] for raw messages,
    /// which have no headers to read the sender and recipients from.
    pub fn new(message: &Message) -> Result<Self, EnvelopeError> {
        match message {
            Message::Structured(sms) => Ok(Self {
                sms: sms.clone(),
                from: None,
                recipients: None,
            }),
            Message::Raw(_) => Err(EnvelopeError::NotStructured),
        }
    }

    /// The overridden sender, or the `From` of the message
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::UnknownSender`] when neither is available.
    pub fn from(&self) -> Result<&Phone, EnvelopeError> {
        self.from
            .as_ref()
            .or_else(|| self.sms.from_phone())
            .ok_or(EnvelopeError::UnknownSender)
    }

    pub fn set_from(&mut self, from: Phone) {
        self.from = Some(from);
    }

    /// The overridden recipients, or the `To` list of the message
    #[must_use]
    pub fn recipients(&self) -> &[Phone] {
        self.recipients
            .as_deref()
            .unwrap_or_else(|| self.sms.recipients())
    }

    /// Override the recipients; an empty list keeps reading the message
    pub fn set_recipients(&mut self, recipients: Vec<Phone>) {
        self.recipients = (!recipients.is_empty()).then_some(recipients);
    }
}

/// The sender and recipients of one send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Explicit(SmsEnvelope),
    Deferred(DeferredEnvelope),
}

impl Envelope {
    /// An explicit envelope
    #[must_use]
    pub fn new<I, P>(from: impl Into<Phone>, recipients: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Phone>,
    {
        Self::Explicit(SmsEnvelope::new(
            from.into(),
            recipients.into_iter().map(Into::into).collect(),
        ))
    }

    /// A deferred envelope reading the addressing fields of `message`
    ///
    /// # Errors
    ///
    /// See [`DeferredEnvelope::new`].
    pub fn deferred(message: &Message) -> Result<Self, EnvelopeError> {
        DeferredEnvelope::new(message).map(Self::Deferred)
    }

    /// The sender of the message
    ///
    /// # Errors
    ///
    /// Only a deferred envelope can fail, see [`DeferredEnvelope::from`].
    pub fn from(&self) -> Result<&Phone, EnvelopeError> {
        match self {
            Self::Explicit(envelope) => Ok(&envelope.from),
            Self::Deferred(envelope) => envelope.from(),
        }
    }

    pub fn set_from(&mut self, from: Phone) {
        match self {
            Self::Explicit(envelope) => envelope.from = from,
            Self::Deferred(envelope) => envelope.set_from(from),
        }
    }

    #[must_use]
    pub fn recipients(&self) -> &[Phone] {
        match self {
            Self::Explicit(envelope) => &envelope.recipients,
            Self::Deferred(envelope) => envelope.recipients(),
        }
    }

    pub fn set_recipients(&mut self, recipients: Vec<Phone>) {
        match self {
            Self::Explicit(envelope) => envelope.recipients = recipients,
            Self::Deferred(envelope) => envelope.set_recipients(recipients),
        }
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Point a deferred envelope at `message`, keeping any overrides
    ///
    /// Used after hooks have rewritten the message so the envelope reads the
    /// final headers. Explicit envelopes and raw messages are left alone.
    pub fn track(&mut self, message: &Message) {
        if let (Self::Deferred(envelope), Message::Structured(sms)) = (self, message) {
            envelope.sms = sms.clone();
        }
    }
}

impl From<SmsEnvelope> for Envelope {
    fn from(value: SmsEnvelope) -> Self {
        Self::Explicit(value)
    }
}

impl From<DeferredEnvelope> for Envelope {
    fn from(value: DeferredEnvelope) -> Self {
        Self::Deferred(value)
    }
}
