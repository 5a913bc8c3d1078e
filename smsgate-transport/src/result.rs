//! Per-recipient outcome of one send attempt
//!
//! A [`SendResult`] is created fresh for every send, bound to the transport
//! that produced it, and only ever appended to while that send is running.

use std::{error::Error as StdError, sync::Arc};

use ahash::AHashMap;
use smsgate_common::Phone;

/// Arbitrary key/value data a backend attaches to an outcome (message ids, ...)
pub type ResultData = AHashMap<String, String>;

/// A recipient that was accepted by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessResult {
    recipient: Phone,
    data: ResultData,
}

impl SuccessResult {
    #[must_use]
    pub fn new(recipient: Phone) -> Self {
        Self {
            recipient,
            data: ResultData::default(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: ResultData) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub const fn recipient(&self) -> &Phone {
        &self.recipient
    }

    #[must_use]
    pub const fn data(&self) -> &ResultData {
        &self.data
    }
}

/// A recipient the transport failed to deliver to
#[derive(Debug, Clone)]
pub struct ErrorResult {
    recipient: Phone,
    message: String,
    code: String,
    data: ResultData,
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ErrorResult {
    #[must_use]
    pub fn new(recipient: Phone, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            recipient,
            message: message.into(),
            code: code.into(),
            data: ResultData::default(),
            cause: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: ResultData) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    #[must_use]
    pub const fn recipient(&self) -> &Phone {
        &self.recipient
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub const fn data(&self) -> &ResultData {
        &self.data
    }

    #[must_use]
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

/// Either outcome, as handed to [`SendResult::add`]
#[derive(Debug, Clone)]
pub enum ResultItem {
    Success(SuccessResult),
    Error(ErrorResult),
}

impl From<SuccessResult> for ResultItem {
    fn from(value: SuccessResult) -> Self {
        Self::Success(value)
    }
}

impl From<ErrorResult> for ResultItem {
    fn from(value: ErrorResult) -> Self {
        Self::Error(value)
    }
}

/// Successes and errors of one send, in insertion order
#[derive(Debug, Clone)]
pub struct SendResult {
    transport: &'static str,
    successes: Vec<SuccessResult>,
    errors: Vec<ErrorResult>,
}

impl SendResult {
    /// Create an empty result for the transport identified by `transport`
    #[must_use]
    pub const fn new(transport: &'static str) -> Self {
        Self {
            transport,
            successes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Identity (type name) of the transport that produced this result
    #[must_use]
    pub const fn transport(&self) -> &'static str {
        self.transport
    }

    pub fn add(&mut self, item: impl Into<ResultItem>) {
        match item.into() {
            ResultItem::Success(success) => self.successes.push(success),
            ResultItem::Error(error) => self.errors.push(error),
        }
    }

    #[must_use]
    pub fn successes(&self) -> &[SuccessResult] {
        &self.successes
    }

    #[must_use]
    pub fn errors(&self) -> &[ErrorResult] {
        &self.errors
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
