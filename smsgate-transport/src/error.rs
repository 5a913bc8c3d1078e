//! Typed error handling for transport resolution and delivery.
//!
//! Errors fall into three groups:
//! - DSN and resolution errors - configuration problems, never retried
//! - Transport errors - a send failed in a way another transport may not;
//!   composite routers mark the member dead and move on
//! - Fatal errors - anything else raised during a send; routers let these
//!   through untouched

use thiserror::Error;

use smsgate_common::EnvelopeError;

use crate::result::SendResult;

/// The DSN string is not a usable transport address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DsnError {
    /// The string cannot be read as `scheme://...` at all.
    #[error("The \"{0}\" SMS Sender DSN is invalid.")]
    Malformed(String),

    /// No scheme component.
    #[error("The \"{0}\" SMS Sender DSN must contain a transport scheme.")]
    MissingScheme(String),

    /// No host (the transport name).
    #[error("The \"{0}\" SMS Sender DSN must contain a SMS Sender name.")]
    MissingHost(String),
}

/// A DSN could not be turned into a transport.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The DSN itself is invalid.
    #[error(transparent)]
    Dsn(#[from] DsnError),

    /// A factory claims the host but does not handle this scheme.
    #[error("{}", unsupported_scheme_message(.scheme, .host, .supported))]
    UnsupportedScheme {
        scheme: String,
        host: String,
        supported: Vec<String>,
    },

    /// No registered factory claims the host.
    ///
    /// `package` is set when the host belongs to a known optional backend
    /// that is not part of this build.
    #[error("{}", host_message(.host, .package))]
    UnsupportedHost {
        host: String,
        package: Option<String>,
    },

    /// A factory recognises the DSN but a required part is absent.
    #[error("{0}")]
    IncompleteDsn(String),

    /// A DSN option holds a value the factory can't use.
    #[error("Invalid value \"{value}\" for the \"{key}\" option")]
    InvalidOption { key: String, value: String },

    /// A composite transport was built from an empty list.
    #[error("{0} must have at least one transport configured.")]
    NoTransports(&'static str),
}

impl ResolveError {
    /// Build an [`UnsupportedScheme`](Self::UnsupportedScheme) error for `dsn`
    #[must_use]
    pub fn unsupported_scheme(dsn: &crate::Dsn, supported: &[&str]) -> Self {
        Self::UnsupportedScheme {
            scheme: dsn.scheme().to_string(),
            host: dsn.host().to_string(),
            supported: supported.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Message of [`ResolveError::UnsupportedScheme`]
#[must_use]
pub fn unsupported_scheme_message(scheme: &str, host: &str, supported: &[String]) -> String {
    let mut message = format!("The \"{scheme}\" scheme is not supported for SMS Sender \"{host}\".");

    if !supported.is_empty() {
        message.push_str(&format!(
            " Supported schemes are: \"{}\".",
            supported.join("\", \"")
        ));
    }

    message
}

/// Message of [`ResolveError::UnsupportedHost`]
#[must_use]
pub fn unsupported_host_message(host: &str, package: Option<&str>) -> String {
    package.map_or_else(
        || format!("The \"{host}\" SMS Sender is not supported."),
        |package| {
            format!(
                "Unable to send sms via \"{host}\" as the bridge is not installed. Try enabling \"{package}\"."
            )
        },
    )
}

#[allow(clippy::ref_option)]
fn host_message(host: &str, package: &Option<String>) -> String {
    unsupported_host_message(host, package.as_deref())
}

/// An argument handed to a transport has the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidArgument(pub String);

/// Per-recipient failures reported by a transport.
///
/// The transport call itself completed; zero or more recipients may still have
/// succeeded, so callers must inspect [`result`](Self::result).
#[derive(Debug, Clone, Error)]
#[error("{}", result_message(.result))]
pub struct TransportResultError {
    result: SendResult,
}

impl TransportResultError {
    #[must_use]
    pub const fn new(result: SendResult) -> Self {
        Self { result }
    }

    #[must_use]
    pub const fn result(&self) -> &SendResult {
        &self.result
    }

    #[must_use]
    pub fn into_result(self) -> SendResult {
        self.result
    }
}

fn result_message(result: &SendResult) -> String {
    let mut message = String::from("Unable to send an SMS for recipients:");

    for error in result.errors() {
        message.push_str(&format!(
            "\n- {}: {} ({})",
            error.recipient(),
            error.message(),
            error.code()
        ));
    }

    message
}

/// Send-time failures of a transport; composite routers fail over on these.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No envelope was given and none could be derived from the message.
    #[error("Cannot send message without a valid envelope.")]
    InvalidEnvelope(#[source] EnvelopeError),

    /// The transport can't handle this kind of message.
    #[error("Unable to send message with the \"{transport}\" transport: {source}")]
    UnsupportedMessage {
        transport: String,
        #[source]
        source: InvalidArgument,
    },

    /// Every member of a composite transport failed.
    #[error("All transports failed.")]
    AllTransportsFailed,

    /// Some recipients were rejected.
    #[error(transparent)]
    Result(#[from] TransportResultError),

    /// The transport needs a sender and the message has none.
    #[error("The transport required the \"From\" information")]
    MissingSender,

    /// The backend reported a failure of its own.
    #[error("Transport \"{transport}\" failed: {message}")]
    Backend { transport: String, message: String },
}

/// Failures that are not a transport's fault; never trigger failover.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The envelope could not provide what the transport needed.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Programmer or configuration error inside a backend.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome of a failed send.
#[derive(Debug, Error)]
pub enum SendError {
    /// Recoverable by trying another transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Propagated to the caller as-is.
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl SendError {
    /// Returns `true` if a composite router should try another member.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// The per-recipient result of a partial failure, if this is one.
    #[must_use]
    pub const fn result(&self) -> Option<&SendResult> {
        match self {
            Self::Transport(TransportError::Result(error)) => Some(error.result()),
            _ => None,
        }
    }
}

impl From<EnvelopeError> for SendError {
    fn from(error: EnvelopeError) -> Self {
        Self::Fatal(FatalError::Envelope(error))
    }
}

impl From<TransportResultError> for SendError {
    fn from(error: TransportResultError) -> Self {
        Self::Transport(TransportError::Result(error))
    }
}
