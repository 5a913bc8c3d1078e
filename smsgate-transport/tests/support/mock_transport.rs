//! Scriptable transport for router and resolver tests
#![allow(dead_code)] // Test utility module - not all methods used in every test
//!
//! Every send is appended to a [`CallLog`] shared between mocks, so a test can
//! assert on the exact order in which a router tried its members.

use std::sync::Arc;

use parking_lot::Mutex;
use smsgate_common::{Envelope, Message};
use smsgate_transport::{
    FatalError, SendError, SendResult, SentMessage, SuccessResult, Transport, TransportError,
};

/// What the next send of a mock does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
    Fatal,
}

/// Names of the mocks that were asked to send, in call order
#[derive(Debug, Default, Clone)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().iter().filter(|call| *call == name).count()
    }
}

#[derive(Debug)]
pub struct MockTransport {
    name: String,
    outcome: Mutex<Outcome>,
    requires_sender: bool,
    log: CallLog,
}

impl MockTransport {
    pub fn new(name: &str, log: &CallLog) -> Arc<Self> {
        Self::with_outcome(name, log, Outcome::Succeed)
    }

    pub fn with_outcome(name: &str, log: &CallLog, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Mutex::new(outcome),
            requires_sender: true,
            log: log.clone(),
        })
    }

    pub fn without_sender(name: &str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Mutex::new(Outcome::Succeed),
            requires_sender: false,
            log: log.clone(),
        })
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock() = outcome;
    }
}

impl Transport for MockTransport {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn has_required_sender(&self) -> bool {
        self.requires_sender
    }

    fn send(
        &self,
        message: &Message,
        envelope: Option<&Envelope>,
    ) -> Result<Option<SentMessage>, SendError> {
        self.log.0.lock().push(self.name.clone());

        match *self.outcome.lock() {
            Outcome::Succeed => {
                let envelope = envelope
                    .cloned()
                    .unwrap_or_else(|| Envelope::new("+1", ["+2"]));
                let mut result = SendResult::new("MockTransport");
                for recipient in envelope.recipients() {
                    result.add(SuccessResult::new(recipient.clone()));
                }
                Ok(Some(SentMessage::new(message.clone(), envelope, result)))
            }
            Outcome::Fail => Err(TransportError::Backend {
                transport: self.name.clone(),
                message: "connection refused".to_string(),
            }
            .into()),
            Outcome::Fatal => Err(FatalError::Internal(format!("{} is misconfigured", self.name)).into()),
        }
    }
}

/// Erase the concrete type for router constructors
pub fn members(mocks: &[&Arc<MockTransport>]) -> Vec<Arc<dyn Transport>> {
    mocks
        .iter()
        .map(|mock| Arc::clone(*mock) as Arc<dyn Transport>)
        .collect()
}
