//! Error types for the smsgate-common crate.

use thiserror::Error;

/// Errors raised while resolving the sender and recipients of a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// A deferred envelope can only read `From`/`To` from a structured message.
    #[error("A deferred SMS envelope requires a structured message (raw message given).")]
    NotStructured,

    /// Neither an explicit sender nor a `From` header is available.
    #[error("Unable to determine the sender of the message.")]
    UnknownSender,
}

/// Errors that can occur while parsing a raw message into an [`Sms`](crate::Sms).
#[derive(Debug, Error)]
pub enum MessageParseError {
    /// The raw bytes could not be parsed as a header block followed by a body.
    #[error("Invalid message structure: {0}")]
    Mail(#[from] mailparse::MailParseError),

    /// A `From` header is present but holds no phone.
    #[error("Empty {0} header")]
    EmptyHeader(&'static str),
}
