//! Pre-send transformation and post-send observation

use std::{fmt::Debug, sync::Arc};

use ahash::AHashMap;
use smsgate_common::{Envelope, Message, Phone, tracing};

use crate::transport::SentMessage;

/// Callbacks run by every leaf transport around delivery
pub trait MessageHooks: Send + Sync + Debug {
    /// Transform the message and envelope before they are delivered
    fn before_send(&self, message: Message, envelope: Envelope) -> (Message, Envelope) {
        (message, envelope)
    }

    /// Observe a completed delivery
    fn after_send(&self, _sent: &SentMessage) {}
}

/// Does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl MessageHooks for NoHooks {}

/// Runs several hooks in registration order
///
/// Each `before_send` receives the output of the previous one.
#[derive(Debug, Default, Clone)]
pub struct HookChain {
    hooks: Vec<Arc<dyn MessageHooks>>,
}

impl HookChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, hook: Arc<dyn MessageHooks>) -> Self {
        self.push(hook);
        self
    }

    pub fn push(&mut self, hook: Arc<dyn MessageHooks>) {
        self.hooks.push(hook);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl MessageHooks for HookChain {
    fn before_send(&self, message: Message, envelope: Envelope) -> (Message, Envelope) {
        self.hooks
            .iter()
            .fold((message, envelope), |(message, envelope), hook| {
                tracing::trace!(?hook, "Running before_send hook");
                hook.before_send(message, envelope)
            })
    }

    fn after_send(&self, sent: &SentMessage) {
        for hook in &self.hooks {
            tracing::trace!(?hook, "Running after_send hook");
            hook.after_send(sent);
        }
    }
}

/// Adds configured headers to structured messages
///
/// `From` and `To` are unique: they only fill in a missing sender or an empty
/// recipient list. Every other header is appended, next to any value the
/// message already carries. Raw messages pass through untouched.
#[derive(Debug, Default, Clone)]
pub struct DefaultHeaders {
    headers: AHashMap<String, String>,
}

impl DefaultHeaders {
    #[must_use]
    pub const fn new(headers: AHashMap<String, String>) -> Self {
        Self { headers }
    }
}

impl MessageHooks for DefaultHeaders {
    fn before_send(&self, mut message: Message, envelope: Envelope) -> (Message, Envelope) {
        let Some(sms) = message.as_sms_mut() else {
            return (message, envelope);
        };

        let mut names = self.headers.keys().collect::<Vec<_>>();
        names.sort();

        for name in names {
            let unique = name.eq_ignore_ascii_case("from") || name.eq_ignore_ascii_case("to");
            if unique && sms.has_header(name) {
                continue;
            }

            let value = &self.headers[name];
            if name.eq_ignore_ascii_case("from") {
                sms.set_from(Phone::new(value));
            } else if name.eq_ignore_ascii_case("to") {
                sms.set_recipients(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|phone| !phone.is_empty())
                        .map(Phone::new)
                        .collect(),
                );
            } else {
                sms.add_header(name.as_str(), value.as_str());
            }
        }

        (message, envelope)
    }
}
