//! Shared building blocks for smsgate: phones, messages and envelopes,
//! plus the logging setup used by every crate in the workspace.

pub mod envelope;
pub mod error;
pub mod logging;
pub mod message;
pub mod phone;

pub use envelope::{DeferredEnvelope, Envelope, SmsEnvelope};
pub use error::{EnvelopeError, MessageParseError};
pub use message::{Message, RawMessage, Sms};
pub use phone::Phone;
pub use tracing;
